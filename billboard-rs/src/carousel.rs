//! The rotating slide sequence behind a display.
//!
//! A [`Carousel`] only tracks state; whoever renders it owns the timer, sleeping for
//! [`Carousel::dwell`] and then calling [`Carousel::advance`].

use crate::api::{MediaKind, Slide};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Carousel {
    slides: Vec<Slide>,
    index: usize,
    /// Dwell for images, and for videos whose length is not yet known.
    slide_duration: Duration,
    /// Reported video lengths, keyed by URL so they survive playlist refreshes.
    video_lengths: HashMap<String, Duration>,
}

impl Carousel {
    pub fn new(slides: Vec<Slide>, slide_duration: Duration) -> Self {
        Self {
            slides,
            index: 0,
            slide_duration,
            video_lengths: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Slide> {
        self.slides.get(self.index)
    }

    pub fn set_slide_duration(&mut self, duration: Duration) {
        self.slide_duration = duration;
    }

    /// How long the current slide should stay on screen.
    pub fn dwell(&self) -> Duration {
        match self.current() {
            Some(slide) if slide.kind == MediaKind::Video => self
                .video_lengths
                .get(&slide.url)
                .copied()
                .unwrap_or(self.slide_duration),
            _ => self.slide_duration,
        }
    }

    /// Record the playing length of a video once the renderer knows it.
    pub fn report_video_length(&mut self, url: &str, length: Duration) {
        if length.is_zero() {
            return;
        }
        self.video_lengths.insert(url.to_string(), length);
    }

    /// Move to the next slide, wrapping around after the last one.
    pub fn advance(&mut self) -> Option<&Slide> {
        if self.slides.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.slides.len();
        self.current()
    }

    /// Position within the sequence as a percentage: 0 on the first slide, 100 on the last.
    pub fn progress(&self) -> Option<f64> {
        match self.slides.len() {
            0 => None,
            1 => Some(0.0),
            n => Some(self.index as f64 / (n - 1) as f64 * 100.0),
        }
    }

    /// Swap in a refreshed playlist. Stays on the current slide if it is still present,
    /// otherwise starts over from the first.
    pub fn replace_slides(&mut self, slides: Vec<Slide>) {
        let current_url = self.current().map(|s| s.url.clone());
        self.index = current_url
            .and_then(|url| slides.iter().position(|s| s.url == url))
            .unwrap_or(0);
        self.video_lengths
            .retain(|url, _| slides.iter().any(|s| &s.url == url));
        self.slides = slides;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn slide(name: &str) -> Slide {
        let kind = crate::paths::media_kind(name).unwrap();
        Slide {
            id: Uuid::new_v4(),
            url: format!("/media/2025/internal/March/{name}"),
            name: name.to_string(),
            kind,
            length_ms: None,
        }
    }

    #[test]
    fn loops_around() {
        let mut carousel = Carousel::new(
            vec![slide("a.png"), slide("b.png"), slide("c.png")],
            Duration::from_secs(20),
        );
        assert_eq!(carousel.current().unwrap().name, "a.png");
        assert_eq!(carousel.advance().unwrap().name, "b.png");
        assert_eq!(carousel.advance().unwrap().name, "c.png");
        assert_eq!(carousel.advance().unwrap().name, "a.png");
    }

    #[test]
    fn empty_carousel_has_nothing_to_show() {
        let mut carousel = Carousel::new(vec![], Duration::from_secs(20));
        assert!(carousel.current().is_none());
        assert!(carousel.advance().is_none());
        assert_eq!(carousel.progress(), None);
        assert_eq!(carousel.dwell(), Duration::from_secs(20));
    }

    #[test]
    fn videos_dwell_for_their_length_once_known() {
        let mut carousel = Carousel::new(
            vec![slide("a.png"), slide("clip.mp4")],
            Duration::from_secs(20),
        );
        carousel.advance();
        assert_eq!(carousel.dwell(), Duration::from_secs(20));

        let url = carousel.current().unwrap().url.clone();
        carousel.report_video_length(&url, Duration::from_secs(42));
        assert_eq!(carousel.dwell(), Duration::from_secs(42));

        // back on an image, the route duration applies again
        carousel.advance();
        assert_eq!(carousel.dwell(), Duration::from_secs(20));
    }

    #[test]
    fn progress_runs_from_zero_to_hundred() {
        let mut carousel = Carousel::new(
            vec![slide("a.png"), slide("b.png"), slide("c.png")],
            Duration::from_secs(5),
        );
        assert_eq!(carousel.progress(), Some(0.0));
        carousel.advance();
        assert_eq!(carousel.progress(), Some(50.0));
        carousel.advance();
        assert_eq!(carousel.progress(), Some(100.0));

        let single = Carousel::new(vec![slide("a.png")], Duration::from_secs(5));
        assert_eq!(single.progress(), Some(0.0));
    }

    #[test]
    fn refresh_keeps_position_when_possible() {
        let a = slide("a.png");
        let b = slide("b.png");
        let c = slide("c.png");
        let mut carousel = Carousel::new(vec![a.clone(), b.clone()], Duration::from_secs(5));
        carousel.advance();

        carousel.replace_slides(vec![c.clone(), a.clone(), b.clone()]);
        assert_eq!(carousel.current().unwrap().name, "b.png");
        assert_eq!(carousel.index(), 2);

        carousel.replace_slides(vec![c, a]);
        assert_eq!(carousel.index(), 0);
        assert_eq!(carousel.current().unwrap().name, "c.png");
    }
}
