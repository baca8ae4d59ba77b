use application::analyze_service::{AnalyzeRequest, AnalyzeService};
use application::conversation_service::{ConversationService, SilentObserver, UserTurn};
use application::prompt::SYSTEM_INSTRUCTION;
use domain::session::{Role, Session};
use pretty_assertions::assert_eq;
use presentation::view::SessionView;
use shared::error::{MissingInputError, RepoMindError};
use tempfile::TempDir;
use tests::{segment_count, write_zip, Reply, ScriptedClient};
use tokio_util::sync::CancellationToken;

async fn load(session: &mut Session, archive: std::path::PathBuf) -> Result<usize, RepoMindError> {
    AnalyzeService::new(false)
        .on_analyze_requested(
            session,
            AnalyzeRequest {
                api_key: Some("user-key".into()),
                archive: Some(archive),
            },
        )
        .await
        .map(|outcome| outcome.file_count)
}

#[tokio::test]
async fn file_paths_match_blob_segments() {
    let tmp = TempDir::new().expect("tempdir");
    let zip = write_zip(
        tmp.path(),
        "shop.zip",
        &[
            ("shop/", ""),
            ("shop/app.py", "from flask import Flask"),
            ("shop/templates/index.html", "<button class='buy'>Buy</button>"),
            ("shop/static/style.css", ".buy { color: #fff; background: #fff; }"),
            ("shop/schema.sql", "CREATE TABLE items (id INT);"),
            ("shop/README.md", "# Shop"),
        ],
    );
    let mut session = Session::new();

    let count = load(&mut session, zip).await.expect("load");

    let repo = session.repository().expect("repository");
    assert_eq!(count, 5);
    assert_eq!(repo.file_count(), segment_count(repo.context_blob()));
}

#[tokio::test]
async fn hidden_directories_contribute_nothing() {
    let tmp = TempDir::new().expect("tempdir");
    let zip = write_zip(
        tmp.path(),
        "repo.zip",
        &[
            (".github/workflows/ci.json", "{}"),
            ("src/.cache/generated.js", "cached()"),
            ("src/index.js", "main()"),
        ],
    );
    let mut session = Session::new();

    load(&mut session, zip).await.expect("load");

    let repo = session.repository().expect("repository");
    assert_eq!(repo.file_paths(), ["src/index.js".to_string()]);
    assert!(repo.file_paths().iter().all(|p| !p.contains("/.") && !p.starts_with('.')));
}

#[tokio::test]
async fn empty_archive_is_a_successful_load() {
    let tmp = TempDir::new().expect("tempdir");
    let zip = write_zip(tmp.path(), "empty.zip", &[]);
    let mut session = Session::new();
    assert!(!SessionView::from_session(&session).chat_input_visible);

    let count = load(&mut session, zip).await.expect("load");

    assert_eq!(count, 0);
    let repo = session.repository().expect("repository");
    assert!(repo.file_paths().is_empty());
    assert_eq!(repo.context_blob(), "");
    assert!(SessionView::from_session(&session).chat_input_visible);
}

#[tokio::test]
async fn corrupt_archive_keeps_chat_inactive() {
    let tmp = TempDir::new().expect("tempdir");
    let bogus = tmp.path().join("project.zip");
    std::fs::write(&bogus, "just some text pretending to be a zip").expect("write");
    let mut session = Session::new();

    let err = load(&mut session, bogus).await.expect_err("should fail");

    assert!(matches!(err, RepoMindError::Archive(_)));
    assert!(session.repository().is_none());
    assert!(!SessionView::from_session(&session).chat_input_visible);
}

#[tokio::test]
async fn chat_input_appears_only_after_load() {
    let tmp = TempDir::new().expect("tempdir");
    let zip = write_zip(tmp.path(), "repo.zip", &[("main.ts", "export {}")]);
    let mut session = Session::new();

    let before = SessionView::from_session(&session);
    load(&mut session, zip).await.expect("load");
    let after = SessionView::from_session(&session);

    assert!(!before.chat_input_visible);
    assert!(after.chat_input_visible);
}

#[tokio::test]
async fn successful_turn_records_user_and_assistant() {
    let tmp = TempDir::new().expect("tempdir");
    let zip = write_zip(tmp.path(), "repo.zip", &[("ui/button.jsx", "<Button hidden />")]);
    let mut session = Session::new();
    load(&mut session, zip).await.expect("load");

    let client = ScriptedClient::new(vec![Reply::Chunks(vec![
        "The button ",
        "has the `hidden` ",
        "prop.",
    ])]);
    let mut conversation = ConversationService::new(client.clone());

    let reply = conversation
        .on_user_turn_submitted(
            &mut session,
            UserTurn::new("Why is the button invisible?"),
            &mut SilentObserver,
            &CancellationToken::new(),
        )
        .await
        .expect("turn");

    assert_eq!(reply, "The button has the `hidden` prop.");
    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role(), Role::User);
    assert_eq!(messages[0].content(), "Why is the button invisible?");
    assert!(messages[0].image().is_none());
    assert_eq!(messages[1].role(), Role::Assistant);
    assert_eq!(messages[1].content(), reply);

    assert_eq!(client.api_key().as_deref(), Some("user-key"));
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].len(), 3);
    assert_eq!(prompts[0][0].as_text(), Some(SYSTEM_INSTRUCTION));
    assert!(prompts[0][1]
        .as_text()
        .expect("context part")
        .contains("<Button hidden />"));
}

#[tokio::test]
async fn failed_turn_records_only_user_then_retry_works() {
    let tmp = TempDir::new().expect("tempdir");
    let zip = write_zip(tmp.path(), "repo.zip", &[("app.py", "pass")]);
    let mut session = Session::new();
    load(&mut session, zip).await.expect("load");

    let client = ScriptedClient::new(vec![
        Reply::ChunksThenError(vec!["Looking"], "Resource has been exhausted"),
        Reply::Chunks(vec!["All good."]),
    ]);
    let mut conversation = ConversationService::new(client);

    let err = conversation
        .on_user_turn_submitted(
            &mut session,
            UserTurn::new("What does app.py do?"),
            &mut SilentObserver,
            &CancellationToken::new(),
        )
        .await
        .expect_err("first turn fails");
    assert!(err.to_string().contains("Resource has been exhausted"));
    assert_eq!(session.transcript().len(), 1);
    assert!(session.repository().is_some());

    conversation
        .on_user_turn_submitted(
            &mut session,
            UserTurn::new("What does app.py do?"),
            &mut SilentObserver,
            &CancellationToken::new(),
        )
        .await
        .expect("retry succeeds");

    let roles: Vec<Role> = session.transcript().messages().iter().map(|m| m.role()).collect();
    assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn delimiter_text_survives_unescaped() {
    let tmp = TempDir::new().expect("tempdir");
    let source = "const marker = \"--- END FILE: fake.js ---\";\n";
    let zip = write_zip(tmp.path(), "repo.zip", &[("parser.js", source)]);
    let mut session = Session::new();

    load(&mut session, zip).await.expect("load");

    let repo = session.repository().expect("repository");
    assert!(repo.context_blob().contains(source));
    assert!(repo.context_blob().contains("--- END FILE: fake.js ---"));
    assert_eq!(repo.file_count(), 1);
}

#[tokio::test]
async fn turn_without_repository_is_refused() {
    let mut session = Session::with_api_key(Some("k".into()));
    let client = ScriptedClient::new(Vec::new());
    let mut conversation = ConversationService::new(client.clone());

    let err = conversation
        .on_user_turn_submitted(
            &mut session,
            UserTurn::new("hello?"),
            &mut SilentObserver,
            &CancellationToken::new(),
        )
        .await
        .expect_err("refused");

    assert!(matches!(
        err,
        RepoMindError::MissingInput(MissingInputError::RepositoryNotLoaded)
    ));
    assert!(client.prompts().is_empty());
}
