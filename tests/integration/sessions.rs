use crate::*;

use fastphotos_core::protocol::ResponsePayload;
use fastphotos_core::ResultCode;
use fastphotosd::ScreenMode;

const PHOTO: &str = "https://photos.example.com/session.jpg";

#[tokio::test(start_paused = true)]
async fn new_session_reports_the_viewport() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut s = rx.sender().await;

    s.send(new_session(Some("token-1")));
    let reply = s.recv().await;
    assert_eq!(reply.name, "newSession");
    assert_eq!(
        reply.payload,
        Some(ResponsePayload::Session {
            result: ResultCode::Success,
            window_width: 1920,
            window_height: 1080,
        })
    );

    let mut status = rx.handle.status_watch();
    status
        .wait_for(|st| st.senders.iter().any(|x| x.id == s.id && x.has_token))
        .await
        .unwrap();

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn splash_replaces_the_startup_spinner() {
    let rx = Receiver::spawn(ScriptedFetcher::default());

    tokio::time::sleep(Duration::from_millis(100)).await;
    rx.screen.with(|screen| assert!(screen.spinner()));

    tokio::time::sleep(Duration::from_secs(3)).await;
    rx.screen.with(|screen| {
        assert!(!screen.spinner());
        assert_eq!(screen.mode(), ScreenMode::Splash);
    });

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn invalidating_the_active_session_returns_to_idle() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut s = rx.sender().await;

    s.send(new_session(Some("token-1")));
    s.recv().await;
    s.show(PHOTO);
    assert_eq!(s.recv().await.result(), Some(ResultCode::Success));

    let mut status = rx.handle.status_watch();
    status.wait_for(|st| st.active_sender == Some(s.id)).await.unwrap();
    rx.screen.with(|screen| assert_eq!(screen.mode(), ScreenMode::Photo));

    s.send(Inbound::Photos(Command::InvalidateSession {}));
    status
        .wait_for(|st| st.senders.iter().all(|x| !x.has_token))
        .await
        .unwrap();
    rx.screen.with(|screen| assert_eq!(screen.mode(), ScreenMode::Splash));

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn inactive_sender_cannot_clear_the_screen() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut caster = rx.sender().await;
    let other = rx.sender().await;

    caster.show(PHOTO);
    assert_eq!(caster.recv().await.result(), Some(ResultCode::Success));
    let mut status = rx.handle.status_watch();
    status.wait_for(|st| st.photos_shown == 1).await.unwrap();

    other.send(Inbound::Photos(Command::InvalidateSession {}));
    tokio::time::sleep(Duration::from_millis(50)).await;
    rx.screen.with(|screen| assert_eq!(screen.mode(), ScreenMode::Photo));

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn last_sender_leaving_ends_the_session() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut shutdown_rx = rx.shutdown_tx.subscribe();
    let first = rx.sender().await;
    let second = rx.sender().await;

    let started = tokio::time::Instant::now();
    first.disconnect();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!rx.task.is_finished());

    second.disconnect();
    shutdown_rx.recv().await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(6));

    rx.task.await.unwrap().unwrap();
    assert!(rx.connections.is_empty());
}
