use crate::*;

use fastphotos_core::protocol::ResponsePayload;
use fastphotos_core::{AssetLocation, AssetType, ResultCode};
use fastphotosd::ScreenMode;

const PHOTO_A: &str = "https://photos.example.com/a.jpg";
const PHOTO_B: &str = "https://photos.example.com/b.jpg";

fn asset_url(reply: &ResponseEnvelope) -> Option<&str> {
    match &reply.payload {
        Some(ResponsePayload::Asset { asset, .. }) => Some(asset.url.as_str()),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn newest_request_supersedes_the_one_loading() {
    let fetcher = ScriptedFetcher::default();
    fetcher.delay(PHOTO_A, Duration::from_secs(5));
    let rx = Receiver::spawn(fetcher);
    let mut s = rx.sender().await;

    s.show(PHOTO_A);
    s.show(PHOTO_B);

    let reply = s.recv().await;
    assert_eq!(reply.result(), Some(ResultCode::Success));
    assert_eq!(asset_url(&reply), Some(PHOTO_B));

    // The superseded request never hears back.
    assert!(s.silent_for(Duration::from_secs(60)).await);
    assert_eq!(rx.fetcher.requested(), vec![PHOTO_A, PHOTO_B]);
    rx.screen.with(|screen| {
        assert_eq!(screen.image().map(|(url, _)| url.as_str()), Some(PHOTO_B));
        assert_eq!(screen.mode(), ScreenMode::Photo);
        assert!(!screen.spinner());
    });
    assert_eq!(rx.handle.status().photos_shown, 1);

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn duplicate_requests_share_one_fetch() {
    let fetcher = ScriptedFetcher::default();
    fetcher.delay(PHOTO_A, Duration::from_secs(1));
    let rx = Receiver::spawn(fetcher);
    let mut first = rx.sender().await;
    let mut second = rx.sender().await;

    first.show(PHOTO_A);
    second.show(PHOTO_A);

    assert_eq!(first.recv().await.result(), Some(ResultCode::Success));
    assert_eq!(second.recv().await.result(), Some(ResultCode::Success));
    assert_eq!(rx.fetcher.times_requested(PHOTO_A), 1);

    let mut status = rx.handle.status_watch();
    let status = status.wait_for(|s| s.photos_shown == 1).await.unwrap().clone();
    assert_eq!(status.active_sender, Some(second.id));

    // Both were originators, so neither gets a bystander notice.
    assert!(first.silent_for(Duration::from_secs(1)).await);
    assert!(second.silent_for(Duration::from_secs(1)).await);

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn bystanders_hear_about_new_images() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut watcher = rx.sender().await;
    let mut caster = rx.sender().await;

    caster.show(PHOTO_A);

    let reply = caster.recv().await;
    assert_eq!(reply.result(), Some(ResultCode::Success));

    let notice = watcher.recv().await;
    assert_eq!(notice.name, "newAsset");
    assert!(notice.payload.is_none());

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_reported_to_the_originator_only() {
    let fetcher = ScriptedFetcher::default();
    fetcher.fail(PHOTO_A, FetchError::Status(503));
    let rx = Receiver::spawn(fetcher);
    let mut watcher = rx.sender().await;
    let mut caster = rx.sender().await;

    caster.show(PHOTO_A);
    assert_eq!(caster.recv().await.result(), Some(ResultCode::HttpRequestError));
    assert!(watcher.silent_for(Duration::from_secs(5)).await);

    let status = rx.handle.status();
    assert_eq!(status.photos_shown, 0);
    assert_eq!(status.active_sender, None);

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn invalid_assets_are_rejected_without_fetching() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut s = rx.sender().await;

    let local = AssetDescriptor {
        location: AssetLocation::Other("local".into()),
        asset_type: AssetType::Image,
        url: PHOTO_A.into(),
    };
    s.send(Inbound::Photos(Command::NewAsset {
        payload: NewAssetPayload {
            asset: local,
            precache: None,
        },
    }));
    let reply = s.recv().await;
    assert_eq!(reply.result(), Some(ResultCode::InvalidAssetLocation));
    assert_eq!(asset_url(&reply), Some(PHOTO_A));

    s.show("ftp://photos.example.com/a.jpg");
    assert_eq!(s.recv().await.result(), Some(ResultCode::InvalidUrl));

    assert!(rx.fetcher.requested().is_empty());
    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_times_out_and_keeps_the_spinner() {
    let fetcher = ScriptedFetcher::default();
    fetcher.delay(PHOTO_A, Duration::from_secs(3600));
    let rx = Receiver::spawn(fetcher);
    let mut s = rx.sender().await;

    let started = tokio::time::Instant::now();
    s.show(PHOTO_A);
    let reply = s.recv().await;
    assert_eq!(reply.result(), Some(ResultCode::HttpRequestTimeout));
    assert!(started.elapsed() >= Duration::from_secs(30));

    let mut status = rx.handle.status_watch();
    status.wait_for(|s| s.foreground.loading_url.is_none()).await.unwrap();
    rx.screen.with(|screen| assert!(screen.spinner()));

    // The next request loads normally.
    s.show(PHOTO_B);
    assert_eq!(s.recv().await.result(), Some(ResultCode::Success));

    rx.stop().await;
}
