use touchfish::disguise::{
    Direction, HostHandle, HostSurface, Key, KeyPress, StaticPage, TextSelection,
};
use touchfish::{Command, MemoryStore, PageAgent, ReaderConfig, Response, Status};

const ARTICLE: &str = "Shares of the company rose four percent in early trading on Tuesday.";

async fn start(store: &MemoryStore, page: StaticPage) -> PageAgent<MemoryStore, StaticPage> {
    PageAgent::start(store.clone(), page, &ReaderConfig::default())
        .await
        .unwrap()
}

fn article_page() -> (StaticPage, HostHandle) {
    let mut page = StaticPage::new();
    page.add_block("h1", "Markets");
    let host = page.add_block("p", ARTICLE);
    page.set_attribute(host, "class", "story-body");
    (page, host)
}

async fn load(agent: &mut PageAgent<MemoryStore, StaticPage>, content: &str) -> String {
    let reply = agent
        .handle(Command::LoadBook {
            content: content.to_string(),
            title: None,
        })
        .await;
    match reply {
        Response::Loaded(loaded) => loaded.id,
        other => panic!("load failed: {other:?}"),
    }
}

#[tokio::test]
async fn test_short_selection_gets_minimum_page_size() {
    let store = MemoryStore::new();
    let mut page = StaticPage::new();
    let host = page.add_block("p", "Hello world. Read more below.");
    let text_node = page.children(host)[0];
    let mut agent = start(&store, page).await;

    load(&mut agent, "Hello world.\n\nThis is page two.").await;
    agent.handle(Command::ToggleActive).await;

    let selection = TextSelection {
        common_ancestor: text_node,
        text: "Hello world.".into(),
    };
    assert!(agent.text_selected(&selection).await);

    assert_eq!(agent.session().page_size(), 100);
    assert_eq!(
        agent.handle(Command::GetStatus).await,
        Response::Status(Status {
            active: true,
            has_book: true,
            current_page: 0,
            total_pages: 1,
            selecting_mode: false,
        })
    );
    assert_eq!(
        agent.host().text_content(host).as_deref(),
        Some("Hello world.\n\nThis is page two.")
    );
}

#[tokio::test]
async fn test_page_turns_saturate_and_persist() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    let id = load(&mut agent, &"p".repeat(250)).await;
    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    assert!(agent.element_clicked(host).await);

    for _ in 0..3 {
        assert_eq!(agent.handle(Command::NextPage).await, Response::ack(true));
    }
    assert_eq!(agent.status().current_page, 2);
    assert_eq!(agent.status().total_pages, 3);

    let stored = agent.library().current_document().await.unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.current_page_index, 2);

    agent.key_pressed(KeyPress::ctrl(Key::ArrowLeft)).await;
    assert_eq!(agent.status().current_page, 1);
    assert_eq!(agent.host().text_content(host).unwrap(), "p".repeat(100));
    assert_eq!(agent.host().attribute(host, "class"), Some("story-body"));
}

#[tokio::test]
async fn test_stored_position_follows_selected_page_size() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    load(&mut agent, &"r".repeat(250)).await;
    let imported = agent.library().current_document().await.unwrap().unwrap();
    assert_eq!(imported.total_pages, 2);

    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    assert!(agent.element_clicked(host).await);
    assert_eq!(agent.session().page_size(), 100);

    agent.handle(Command::NextPage).await;
    agent.handle(Command::NextPage).await;

    let stored = agent.library().current_document().await.unwrap().unwrap();
    assert_eq!(stored.current_page_index, 2);
    assert_eq!(stored.total_pages, 3);
    assert!(stored.current_page_index < stored.total_pages.max(1));
    assert_eq!(stored.progress_percent(), 67);
}

#[tokio::test]
async fn test_corner_controls_turn_pages() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;
    assert_eq!(agent.host().status_badge().as_deref(), Some("OFF"));

    load(&mut agent, &"c".repeat(300)).await;
    // No host yet: the controls do nothing
    assert_eq!(agent.control_clicked(Direction::Next).await, None);

    agent.handle(Command::ToggleActive).await;
    assert_eq!(agent.host().status_badge().as_deref(), Some("ON"));
    agent.handle(Command::EnterSelectingMode).await;
    assert!(agent.element_clicked(host).await);

    assert_eq!(agent.control_clicked(Direction::Next).await, Some(1));
    assert_eq!(agent.control_clicked(Direction::Next).await, Some(2));
    assert_eq!(agent.control_clicked(Direction::Next).await, None);
    assert_eq!(agent.control_clicked(Direction::Prev).await, Some(1));
    assert_eq!(agent.host().text_content(host).unwrap(), "c".repeat(100));

    let stored = agent.library().current_document().await.unwrap().unwrap();
    assert_eq!(stored.current_page_index, 1);
}

#[tokio::test]
async fn test_restore_reproduces_page_text() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    load(&mut agent, &"q".repeat(1000)).await;
    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    agent.element_clicked(host).await;
    agent.handle(Command::NextPage).await;
    agent.handle(Command::NextPage).await;
    agent.handle(Command::PrevPage).await;

    agent.handle(Command::RestoreOriginalContent).await;
    assert_eq!(agent.host().text_content(host).as_deref(), Some(ARTICLE));
    assert_eq!(agent.session().selected_host(), Some(host));

    // Deactivating restores as well and releases the host
    agent.handle(Command::NextPage).await;
    assert_eq!(
        agent.handle(Command::ToggleActive).await,
        Response::Active(touchfish::bridge::ActiveState { active: false })
    );
    assert_eq!(agent.host().text_content(host).as_deref(), Some(ARTICLE));
    assert_eq!(agent.session().selected_host(), None);
}

#[tokio::test]
async fn test_hover_highlights_only_content() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let body = page.body();
    let mut agent = start(&store, page).await;
    let controls = agent.host().control(Direction::Next).unwrap();

    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    assert!(agent.host().selecting_indicator());

    agent.pointer_over(host);
    assert_eq!(agent.host().highlighted(), Some(host));
    agent.pointer_over(controls);
    assert_eq!(agent.host().highlighted(), None);
    agent.pointer_over(body);
    assert_eq!(agent.host().highlighted(), None);

    agent.key_pressed(KeyPress::plain(Key::Escape)).await;
    assert!(!agent.session().is_selecting());
    assert!(!agent.host().selecting_indicator());
}

#[tokio::test]
async fn test_state_survives_page_reload() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    load(&mut agent, &"r".repeat(500)).await;
    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    agent.element_clicked(host).await;
    agent.handle(Command::NextPage).await;
    agent.handle(Command::NextPage).await;

    let page = agent.shutdown().await;
    let restarted = start(&store, page).await;

    assert!(restarted.session().is_active());
    assert!(restarted.session().has_book());
    assert_eq!(restarted.session().current_page(), 2);
    // A fresh page has no host until the user picks one again
    assert_eq!(restarted.session().selected_host(), None);
}

#[tokio::test]
async fn test_reload_without_host_keeps_position() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    load(&mut agent, &"s".repeat(500)).await;
    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    agent.element_clicked(host).await;
    for _ in 0..4 {
        agent.handle(Command::NextPage).await;
    }

    // Two reloads in a row, the second page never picks a host
    let page = agent.shutdown().await;
    let page = start(&store, page).await.shutdown().await;
    let restarted = start(&store, page).await;

    let stored = restarted.library().current_document().await.unwrap().unwrap();
    assert_eq!((stored.current_page_index, stored.total_pages), (4, 5));
    assert_eq!(restarted.session().current_page(), 4);
}

#[tokio::test]
async fn test_deleting_every_book_clears_has_book() {
    let store = MemoryStore::new();
    let mut agent = start(&store, StaticPage::new()).await;

    let first = load(&mut agent, "first document").await;
    let second = load(&mut agent, "second document").await;

    let reply = agent.handle(Command::DeleteBook { id: second.clone() }).await;
    let Response::Deleted(deleted) = reply else {
        panic!("unexpected reply {reply:?}");
    };
    assert_eq!(deleted.new_current_id.as_deref(), Some(first.as_str()));
    assert_eq!(agent.session().document().map(|d| d.id.clone()), Some(first.clone()));

    agent.handle(Command::DeleteBook { id: first }).await;
    let status = agent.status();
    assert!(!status.has_book);
    assert_eq!(status.total_pages, 0);

    let reply = agent.handle(Command::DeleteBook { id: second }).await;
    assert!(matches!(reply, Response::Failure(_)));
}

#[tokio::test]
async fn test_switch_book_renders_new_document() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    let first = load(&mut agent, "the first document text").await;
    load(&mut agent, "the second document text").await;
    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    agent.element_clicked(host).await;
    assert_eq!(
        agent.host().text_content(host).as_deref(),
        Some("the second document text")
    );

    assert_eq!(agent.handle(Command::SwitchBook { id: first }).await, Response::ack(true));
    assert_eq!(
        agent.host().text_content(host).as_deref(),
        Some("the first document text")
    );
}

#[tokio::test]
async fn test_host_removed_by_page() {
    let store = MemoryStore::new();
    let (page, host) = article_page();
    let mut agent = start(&store, page).await;

    load(&mut agent, &"s".repeat(400)).await;
    agent.handle(Command::ToggleActive).await;
    agent.handle(Command::EnterSelectingMode).await;
    agent.element_clicked(host).await;
    agent.host_mut().remove(host);

    assert_eq!(agent.handle(Command::NextPage).await, Response::ack(true));
    assert_eq!(agent.handle(Command::RestoreOriginalContent).await, Response::ack(true));
    assert_eq!(agent.session().selected_host(), None);
    assert_eq!(agent.status().current_page, 0);
}
