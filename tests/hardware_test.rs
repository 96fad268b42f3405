// Tests against a real Crazyflie, run with `cargo test -- --ignored` with a radio plugged in

use std::thread::spawn;

use cfpilot::{config, connect, FileTocCache, Vehicle};

#[tokio::test]
#[ignore]
async fn connected_crazyflie_can_be_sent_to_thread() -> Result<(), Box<dyn std::error::Error>> {
    let link_context = crazyflie_link::LinkContext::new();

    // Scan for Crazyflies on the default address
    let found = link_context.scan([0xE7; 5]).await?;

    if let Some(uri) = found.first() {
        let cf = connect(uri, FileTocCache::disabled()).await?;

        let cf = spawn(move || cf).join().unwrap();
        cf.disconnect().await;
    }
    Ok(())
}

#[tokio::test]
#[ignore]
async fn attitude_frames_are_read_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let link_context = crazyflie_link::LinkContext::new();
    let found = link_context.scan([0xE7; 5]).await?;

    if let Some(uri) = found.first() {
        let cf = connect(uri, FileTocCache::disabled()).await?;

        let frames = cfpilot::pilot::read_frames(&cf, &config::attitude(), 3, |_| ()).await?;

        assert_eq!(frames.len(), 3);
        assert!(frames.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(frames[0].get("stateEstimate.yaw").is_some());
        cf.disconnect().await;
    }
    Ok(())
}
