//! Caption Export Formats
//!
//! Flattens per-scene caption segments onto the global timeline and writes
//! them out as SubRip (SRT) or WebVTT.

use serde::{Deserialize, Serialize};

use super::segmenter::segments_for_scene;
use crate::core::{timeline::Timeline, SceneId, TimeSec};

/// A caption segment placed on the global timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedCaption {
    pub scene_id: SceneId,
    pub scene_index: usize,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    pub text: String,
}

/// Every caption the timeline shows, in playback order.
///
/// Scenes with captions disabled or in title-overlay mode contribute nothing.
/// The caption style's uppercase transform is applied to the text.
pub fn timeline_captions(timeline: &Timeline) -> Vec<TimedCaption> {
    let uppercase = timeline.caption_style.uppercase();
    let mut captions = Vec::new();
    let mut scene_start = 0.0;

    for (index, scene) in timeline.scenes.iter().enumerate() {
        if scene.shows_captions() {
            for segment in segments_for_scene(scene) {
                captions.push(TimedCaption {
                    scene_id: scene.id.clone(),
                    scene_index: index,
                    start_sec: scene_start + segment.start,
                    end_sec: scene_start + segment.end,
                    text: if uppercase {
                        segment.text.to_uppercase()
                    } else {
                        segment.text
                    },
                });
            }
        }
        scene_start += scene.duration_sec;
    }

    captions
}

// =============================================================================
// SRT Format
// =============================================================================

/// Exports the timeline's captions to SRT format
pub fn export_srt(timeline: &Timeline) -> String {
    let mut output = String::new();

    for (index, caption) in timeline_captions(timeline).iter().enumerate() {
        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(caption.start_sec),
            format_srt_timestamp(caption.end_sec)
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

/// Formats seconds as SRT timestamp (00:00:00,000)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (hours, mins, secs, ms) = split_timestamp(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

// =============================================================================
// VTT Format
// =============================================================================

/// Exports the timeline's captions to WebVTT format
pub fn export_vtt(timeline: &Timeline) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for caption in timeline_captions(timeline) {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(caption.start_sec),
            format_vtt_timestamp(caption.end_sec)
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

/// Formats seconds as VTT timestamp (00:00:00.000)
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (hours, mins, secs, ms) = split_timestamp(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
}

fn split_timestamp(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    (total_mins / 60, total_mins % 60, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::{CaptionStyle, Scene};

    fn demo_timeline() -> Timeline {
        Timeline::with_scenes(
            "Demo",
            vec![
                Scene::new("A quick test.", 5.0),
                Scene::new("Hidden text.", 2.0).without_captions(),
                Scene::new("Bye.", 3.0),
            ],
        )
    }

    #[test]
    fn test_format_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3723.042), "01:02:03,042");
        assert_eq!(format_srt_timestamp(-4.0), "00:00:00,000");
    }

    #[test]
    fn test_timeline_captions_use_global_time() {
        let captions = timeline_captions(&demo_timeline());

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].start_sec, 0.0);
        assert_eq!(captions[0].end_sec, 5.0);
        assert_eq!(captions[1].scene_index, 2);
        assert_eq!(captions[1].start_sec, 7.0);
        assert_eq!(captions[1].end_sec, 10.0);
    }

    #[test]
    fn test_export_srt() {
        let srt = export_srt(&demo_timeline());
        let expected = "1\n00:00:00,000 --> 00:00:05,000\nA quick test.\n\n2\n00:00:07,000 --> 00:00:10,000\nBye.";
        assert_eq!(srt, expected);
    }

    #[test]
    fn test_export_vtt_applies_uppercase_style() {
        let mut timeline = demo_timeline();
        timeline.caption_style = CaptionStyle::Bold;

        let vtt = export_vtt(&timeline);
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:07.000 --> 00:00:10.000\nBYE."));
    }

    #[test]
    fn test_export_empty_timeline() {
        assert_eq!(export_srt(&Timeline::new("Empty")), "");
    }
}
