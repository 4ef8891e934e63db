//! `bb view`: a terminal rendition of a display.
//!
//! Prints the current slide, sleeps for its dwell time and advances, re-fetching the playlist
//! whenever the refresh interval has passed.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use billboard_rs::api::playlist::Response as PlaylistResponse;
use billboard_rs::api::{MediaKind, Slide};
use billboard_rs::carousel::Carousel;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;

async fn fetch_playlist(
    client: &Client,
    config: &Config,
    route: &str,
) -> Result<(Duration, Vec<Slide>)> {
    let response = client
        .get(config.api_url(&format!("routes/{route}/playlist")))
        .send()
        .await?;
    let status = response.status();
    let text = response.text().await?;
    let playlist: PlaylistResponse = serde_json::from_str(&text)
        .with_context(|| format!("Unexpected playlist response ({status}): {text}"))?;
    match playlist {
        PlaylistResponse::Ok {
            duration, slides, ..
        } => Ok((Duration::from_secs(u64::from(duration)), slides)),
        PlaylistResponse::Invalid { reason } => bail!("Invalid route `{route}`: {reason}"),
        PlaylistResponse::Internal => bail!("Server failed to build the playlist"),
    }
}

/// Swap a fetched playlist into `carousel`, passing on the video lengths the server knows.
fn load_playlist(carousel: &mut Carousel, duration: Duration, slides: Vec<Slide>) {
    for slide in &slides {
        if let Some(ms) = slide.length_ms {
            carousel.report_video_length(&slide.url, Duration::from_millis(ms));
        }
    }
    carousel.set_slide_duration(duration);
    carousel.replace_slides(slides);
}

fn render(carousel: &Carousel, base_url: &str) {
    let Some(slide) = carousel.current() else {
        return;
    };
    let kind = match slide.kind {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
    };
    println!(
        "[{:>3.0}%] {}/{} {kind} {} ({}{}) for {}s",
        carousel.progress().unwrap_or(0.0),
        carousel.index() + 1,
        carousel.len(),
        slide.name,
        base_url.trim_end_matches('/'),
        slide.url,
        carousel.dwell().as_secs()
    );
}

pub async fn view(client: &Client, config: &Config, route: &str, once: bool) -> Result<()> {
    let (duration, slides) = fetch_playlist(client, config, route).await?;
    let mut carousel = Carousel::new(Vec::new(), duration);
    load_playlist(&mut carousel, duration, slides);
    let mut last_refresh = Instant::now();

    loop {
        if carousel.is_empty() {
            println!("This route is not enabled (no media to show).");
            if once {
                return Ok(());
            }
        } else {
            render(&carousel, &config.api.url);
            if once && carousel.index() + 1 == carousel.len() {
                return Ok(());
            }
        }

        let wait = if carousel.is_empty() {
            config.viewer.refresh
        } else {
            carousel.dwell()
        };
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, leaving viewer");
                return Ok(());
            }
        }
        carousel.advance();

        if last_refresh.elapsed() >= config.viewer.refresh {
            match fetch_playlist(client, config, route).await {
                Ok((duration, slides)) => {
                    debug!("refreshed playlist: {} slides", slides.len());
                    load_playlist(&mut carousel, duration, slides);
                }
                // keep showing what we have
                Err(e) => warn!("Failed to refresh playlist: {e:#}"),
            }
            last_refresh = Instant::now();
        }
    }
}
