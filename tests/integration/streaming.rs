use crate::*;

use fastphotos_core::{MediaCommand, MediaLoadRequest};
use fastphotos_services::PlaybackEvent;
use fastphotosd::ScreenMode;

const HD: &str = "https://video.example.com/hd.m3u8";
const SD: &str = "https://video.example.com/sd.m3u8";
const LOW: &str = "https://video.example.com/low.m3u8";

fn load(streams: &[&str]) -> Inbound {
    Inbound::Media(MediaCommand::Load(MediaLoadRequest::with_streams(
        "video-1", streams,
    )))
}

/// Let the runtime drain its queue.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn stalled_stream_steps_down_until_it_plays() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let s = rx.sender().await;
    let mut status = rx.handle.status_watch();

    s.send(load(&[HD, SD, LOW]));
    status.wait_for(|st| st.videos_shown == 1).await.unwrap();
    rx.screen.with(|screen| {
        assert_eq!(screen.stream_url(), Some(HD));
        assert!(screen.spinner());
        assert!(screen.is_video_active());
    });

    // No progress within the degrade window.
    status.wait_for(|st| st.stream_level == 1).await.unwrap();
    rx.screen.with(|screen| assert_eq!(screen.stream_url(), Some(SD)));

    rx.handle
        .playback(PlaybackEvent::TimeUpdate { current_time: 1.0 })
        .unwrap();
    settle().await;
    rx.screen.with(|screen| {
        assert_eq!(screen.mode(), ScreenMode::Video);
        assert!(!screen.spinner());
    });

    // Playing: no further degradation.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(rx.handle.status().stream_level, 1);
    assert_eq!(rx.handle.status().stream_url.as_deref(), Some(SD));

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn lowest_quality_is_never_degraded_further() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let s = rx.sender().await;
    let mut status = rx.handle.status_watch();

    s.send(load(&[HD, LOW]));
    status.wait_for(|st| st.stream_level == 1).await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(rx.handle.status().stream_level, 1);
    rx.screen.with(|screen| assert_eq!(screen.stream_url(), Some(LOW)));

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn next_video_keeps_the_degraded_level() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let s = rx.sender().await;
    let mut status = rx.handle.status_watch();

    s.send(load(&[HD, SD, LOW]));
    status.wait_for(|st| st.stream_level == 1).await.unwrap();
    rx.handle
        .playback(PlaybackEvent::TimeUpdate { current_time: 2.0 })
        .unwrap();
    rx.handle.playback(PlaybackEvent::Ended).unwrap();
    settle().await;
    rx.screen.with(|screen| assert_eq!(screen.mode(), ScreenMode::Photo));

    s.send(load(&[HD, SD, LOW]));
    status.wait_for(|st| st.videos_shown == 2).await.unwrap();
    rx.screen.with(|screen| assert_eq!(screen.stream_url(), Some(SD)));

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn load_without_streams_is_ignored() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let s = rx.sender().await;

    s.send(Inbound::Media(MediaCommand::Load(MediaLoadRequest {
        media: fastphotos_core::protocol::MediaInfo {
            content_id: HD.into(),
            content_type: None,
        },
        custom_data: None,
    })));
    settle().await;

    let status = rx.handle.status();
    assert_eq!(status.videos_shown, 0);
    assert_eq!(status.stream_url, None);
    rx.screen.with(|screen| assert!(screen.stream_url().is_none()));

    rx.stop().await;
}

#[tokio::test(start_paused = true)]
async fn photo_request_pauses_the_video() {
    let rx = Receiver::spawn(ScriptedFetcher::default());
    let mut s = rx.sender().await;
    let mut status = rx.handle.status_watch();

    s.send(load(&[HD, SD]));
    status.wait_for(|st| st.videos_shown == 1).await.unwrap();
    rx.screen.with(|screen| assert!(screen.playing()));

    s.show("https://photos.example.com/still.jpg");
    assert!(s.recv().await.result().is_some_and(|r| r.is_success()));
    rx.screen.with(|screen| {
        assert!(!screen.playing());
        assert_eq!(screen.mode(), ScreenMode::Photo);
    });

    rx.stop().await;
}
