// SPDX-License-Identifier: PMPL-1.0-or-later
//! Media accessibility - WCAG 1.1.1 Non-text Content, 1.2.2 Captions,
//! 1.2.5 Audio Description, 2.2.2 Pause, Stop, Hide, 4.1.3 Status Messages

use crate::analyzers::{accessible_name, AccessibilityModule};
use crate::dom::Element;
use crate::validation::{ComponentType, ValidationCheck, ValidationResult};

/// Media accessibility module
pub struct MediaModule;

const CAROUSELS: &str = "[data-carousel], .carousel, .slider, .swiper";
const CAROUSEL_ITEMS: &str = ".carousel-item, .slide, .swiper-slide";
const CAROUSEL_PREV: &str = "[data-prev], .prev, .carousel-prev";
const CAROUSEL_NEXT: &str = "[data-next], .next, .carousel-next";
const CAROUSEL_INDICATORS: &str = ".carousel-indicators button, .pagination button";
const CAROUSEL_PLAY_PAUSE: &str = "[data-play-pause], .play-pause";

/// Words that repeat what a screen reader already announces
const REDUNDANT_ALT_WORDS: &[&str] = &["image", "images", "picture", "pictures"];

/// Alt text longer than this inside a figure should move to a long description
const LONG_ALT_CHARS: usize = 100;

impl AccessibilityModule for MediaModule {
    fn name(&self) -> &str {
        "Media Accessibility"
    }

    fn description(&self) -> &str {
        "Checks alt text, captions, autoplay and carousels (WCAG 1.1.1, 1.2.2, 2.2.2)"
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Media
    }

    fn applies_to(&self, element: &Element<'_>) -> bool {
        !element
            .query_all_inclusive(&format!("img, video, audio, {}", CAROUSELS))
            .is_empty()
    }

    fn test(&self, element: &Element<'_>) -> ValidationResult {
        test_media_accessibility(element)
    }
}

pub fn test_media_accessibility(element: &Element<'_>) -> ValidationResult {
    let mut result = ValidationResult::new(ComponentType::Media);
    result.record(test_images(element));
    result.record(test_videos(element));
    result.record(test_audio(element));
    if !element.query_all_inclusive(CAROUSELS).is_empty() {
        result.record(test_carousel(element));
    }
    result
}

fn is_decorative(img: &Element<'_>) -> bool {
    matches!(img.attr("role"), Some("presentation") | Some("none"))
        || img.attr("aria-hidden") == Some("true")
}

fn has_redundant_words(alt: &str) -> bool {
    alt.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| REDUNDANT_ALT_WORDS.contains(&word))
}

fn in_caption_construct(img: &Element<'_>) -> bool {
    img.closest("figure").is_some()
        || img
            .parent()
            .is_some_and(|parent| parent.query("figcaption").is_some())
}

/// Alt text presence, decorative markup and alt quality
pub fn test_images(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("images");
    let images = element.query_all_inclusive("img");

    for (i, img) in images.iter().enumerate() {
        let decorative = is_decorative(img);
        let Some(alt) = img.attr("alt") else {
            check.issue(format!("Image {} missing alt attribute", i));
            continue;
        };
        let alt = alt.trim();

        if alt.is_empty() {
            if !decorative {
                check.warning(format!("Image {} has empty alt - confirm it is decorative", i));
            }
            continue;
        }
        if decorative {
            check.issue(format!("Decorative image {} should have empty alt attribute", i));
            continue;
        }
        if has_redundant_words(alt) {
            check.issue(format!("Image {} alt text contains redundant words: \"{}\"", i, alt));
        }
        if in_caption_construct(img)
            && alt.chars().count() > LONG_ALT_CHARS
            && !img.has_attr("longdesc")
            && !img.has_attr("aria-describedby")
        {
            check.warning(format!(
                "Complex image {} should use longdesc or aria-describedby instead of long alt text",
                i
            ));
        }
    }

    check.detail("images", images.len());
    check.finish()
}

fn has_track(video: &Element<'_>, kinds: &[&str]) -> bool {
    video
        .query_all("track")
        .iter()
        .any(|track| track.attr("kind").is_some_and(|kind| kinds.contains(&kind)))
}

/// Captions, descriptions, controls, autoplay and title of videos
pub fn test_videos(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("videos");
    let videos = element.query_all_inclusive("video");

    for (i, video) in videos.iter().enumerate() {
        if !has_track(video, &["captions", "subtitles"]) {
            check.issue(format!("Video {} missing captions/subtitles", i));
        }
        if !has_track(video, &["descriptions"]) && !video.has_attr("data-audio-only") {
            check.warning(format!(
                "Video {} with visual content missing audio descriptions",
                i
            ));
        }
        if !video.has_attr("controls") {
            check.issue(format!("Video {} missing keyboard-accessible controls", i));
        }
        if video.has_attr("autoplay") {
            check.issue(format!(
                "Video {} uses autoplay which can cause accessibility issues",
                i
            ));
        }
        let titled = ["title", "aria-label", "aria-labelledby"]
            .iter()
            .any(|attr| video.non_empty_attr(attr).is_some());
        if !titled {
            check.issue(format!("Video {} missing descriptive title or aria-label", i));
        }
    }

    check.detail("videos", videos.len());
    check.finish()
}

/// Audio should point at a transcript
pub fn test_audio(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("audio");
    let clips = element.query_all_inclusive("audio");

    for (i, audio) in clips.iter().enumerate() {
        if !audio.has_attr("aria-describedby") {
            check.warning(format!(
                "Audio {} missing transcript reference (aria-describedby)",
                i
            ));
        }
        if audio.has_attr("autoplay") {
            check.issue(format!(
                "Audio {} uses autoplay which can cause accessibility issues",
                i
            ));
        }
    }

    check.detail("audio", clips.len());
    check.finish()
}

fn autoplays(carousel: &Element<'_>) -> bool {
    carousel.attr("data-autoplay").is_some_and(|v| v != "false") || carousel.has_class("autoplay")
}

/// Live region, navigation, indicators and pause control of carousels
pub fn test_carousel(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("carousel");
    let carousels = element.query_all_inclusive(CAROUSELS);

    for (i, carousel) in carousels.iter().enumerate() {
        let items = carousel.query_all(CAROUSEL_ITEMS);
        if items.is_empty() {
            check.issue(format!("Carousel {} container has no identifiable items", i));
            continue;
        }

        if carousel.query_all_inclusive("[aria-live]").is_empty() {
            check.issue(format!(
                "Carousel {} missing aria-live region for screen reader announcements",
                i
            ));
        }

        let prev = carousel.query(CAROUSEL_PREV);
        let next = carousel.query(CAROUSEL_NEXT);
        if prev.is_none() || next.is_none() {
            check.issue(format!("Carousel {} missing previous/next navigation buttons", i));
        }
        for (j, button) in prev.iter().chain(next.iter()).enumerate() {
            if accessible_name(button).is_none() {
                check.issue(format!(
                    "Carousel {} navigation button {} missing accessible name",
                    i, j
                ));
            }
        }

        for (j, indicator) in carousel.query_all(CAROUSEL_INDICATORS).iter().enumerate() {
            if indicator.non_empty_attr("aria-label").is_none() {
                check.issue(format!("Carousel {} indicator {} missing aria-label", i, j));
            }
        }

        if autoplays(carousel) && carousel.query(CAROUSEL_PLAY_PAUSE).is_none() {
            check.issue(format!("Auto-playing carousel {} missing play/pause control", i));
        }
    }

    check.detail("carousels", carousels.len());
    check.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn images(markup: &str) -> ValidationCheck {
        let doc = Document::parse(&format!("<div id=\"c\">{}</div>", markup));
        test_images(&doc.component("#c").unwrap())
    }

    #[test]
    fn test_decorative_image_with_alt_flagged() {
        for markup in [
            r#"<img src="a.png" alt="Swirl" aria-hidden="true">"#,
            r#"<img src="a.png" alt="Swirl" role="presentation">"#,
        ] {
            let check = images(markup);
            assert_eq!(check.issues, vec!["Decorative image 0 should have empty alt attribute".to_string()]);
        }
    }

    #[test]
    fn test_empty_alt_not_a_violation() {
        let check = images(r#"<img src="a.png" alt="" aria-hidden="true"><img src="b.png" alt="">"#);
        assert!(check.passed);
        assert_eq!(check.warnings, vec!["Image 1 has empty alt - confirm it is decorative".to_string()]);
    }

    #[test]
    fn test_missing_and_redundant_alt() {
        let check = images(r#"<img src="a.png"><img src="b.png" alt="Picture of the town hall">"#);
        assert_eq!(
            check.issues,
            vec![
                "Image 0 missing alt attribute".to_string(),
                "Image 1 alt text contains redundant words: \"Picture of the town hall\"".to_string(),
            ]
        );
        assert!(images(r#"<img src="b.png" alt="Imagery workshop poster">"#).passed);
    }

    #[test]
    fn test_long_alt_in_figure_warns() {
        let alt = "Chart of household waste volumes per quarter ".repeat(3);
        let check = images(&format!(
            r#"<figure><img src="c.png" alt="{}"><figcaption>Waste 2024</figcaption></figure>"#,
            alt
        ));
        assert!(check.passed);
        assert_eq!(check.warnings.len(), 1);
    }

    #[test]
    fn test_video_rules() {
        let doc = Document::parse(
            r#"<div id="c">
              <video src="a.mp4" autoplay></video>
              <video src="b.mp4" controls title="Council session">
                <track kind="captions" src="b.vtt">
                <track kind="descriptions" src="b-desc.vtt">
              </video>
            </div>"#,
        );
        let check = test_videos(&doc.component("#c").unwrap());
        assert_eq!(check.issues.len(), 4);
        assert!(check.issues.iter().all(|issue| issue.starts_with("Video 0")));
        assert_eq!(check.warnings.len(), 1);
    }

    #[test]
    fn test_audio_transcript_warning() {
        let doc = Document::parse(r#"<div id="c"><audio src="a.mp3" controls></audio></div>"#);
        let check = test_audio(&doc.component("#c").unwrap());
        assert!(check.passed);
        assert_eq!(check.warnings.len(), 1);
    }

    #[test]
    fn test_accessible_carousel() {
        let doc = Document::parse(
            r#"<div class="carousel" data-autoplay="true">
              <div aria-live="polite">
                <div class="carousel-item">One</div>
                <div class="carousel-item">Two</div>
              </div>
              <button class="carousel-prev" aria-label="Previous slide"></button>
              <button class="carousel-next">Next slide</button>
              <div class="carousel-indicators">
                <button aria-label="Slide 1"></button><button aria-label="Slide 2"></button>
              </div>
              <button class="play-pause">Pause</button>
            </div>"#,
        );
        let check = test_carousel(&doc.component(".carousel").unwrap());
        assert!(check.passed, "{:?}", check.issues);
    }

    #[test]
    fn test_broken_carousel() {
        let doc = Document::parse(
            r#"<div class="slider autoplay">
              <div class="slide">One</div>
              <button class="next"></button>
              <div class="pagination"><button></button></div>
            </div>"#,
        );
        let check = test_carousel(&doc.component(".slider").unwrap());
        assert_eq!(
            check.issues,
            vec![
                "Carousel 0 missing aria-live region for screen reader announcements".to_string(),
                "Carousel 0 missing previous/next navigation buttons".to_string(),
                "Carousel 0 navigation button 0 missing accessible name".to_string(),
                "Carousel 0 indicator 0 missing aria-label".to_string(),
                "Auto-playing carousel 0 missing play/pause control".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_carousel() {
        let doc = Document::parse(r#"<div class="swiper"></div>"#);
        let check = test_carousel(&doc.component(".swiper").unwrap());
        assert_eq!(check.issues, vec!["Carousel 0 container has no identifiable items".to_string()]);
    }

    #[test]
    fn test_module_skips_absent_carousel() {
        let doc = Document::parse(r#"<div id="c"><img src="a.png" alt="Lake"></div>"#);
        let result = MediaModule.test(&doc.component("#c").unwrap());
        assert!(result.is_accessible);
        assert!(result.check("carousel").is_none());
        assert_eq!(result.checks.len(), 3);
    }
}
