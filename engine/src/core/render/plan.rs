//! Render Plans
//!
//! Pure translation of scenes into FFmpeg argument lists. Nothing here
//! touches the filesystem or spawns processes, so every filter graph can be
//! asserted on directly.

use std::path::{Path, PathBuf};

use crate::core::{
    captions::{segments_for_scene, wrap_lines},
    settings::{BurnInMode, ExportSettings},
    timeline::{CaptionStyle, MotionType, Scene, Timeline},
    Color, SceneId, TimeSec,
};

/// Sample rate shared by every intermediate clip so concat can stream-copy
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Caption baseline distance from the bottom edge, as a fraction of height
const CAPTION_BOTTOM_MARGIN: f64 = 0.12;

// =============================================================================
// Sources
// =============================================================================

/// Visual input of a scene clip
#[derive(Clone, Debug, PartialEq)]
pub enum VisualSource {
    /// Fetched image held for the clip duration
    Image(PathBuf),
    /// Solid fill used when no image is available
    Placeholder(Color),
}

/// Audio input of a scene clip
#[derive(Clone, Debug, PartialEq)]
pub enum AudioSource {
    /// Fetched narration, padded or truncated to the clip duration
    Narration(PathBuf),
    /// Generated silence of the clip duration
    Silence,
}

// =============================================================================
// Text Overlays
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    /// Burned-in caption near the bottom of the frame
    Caption,
    /// Large centered title on thumbnail scenes
    Title,
}

/// One `drawtext` overlay
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay {
    pub kind: OverlayKind,
    pub lines: Vec<String>,
    /// Visibility window in clip-local seconds; `None` shows it throughout
    pub window: Option<(TimeSec, TimeSec)>,
}

impl TextOverlay {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Builds the text overlays for one scene.
///
/// Segmented mode emits one caption per segment, visible during its window;
/// static mode emits the full scene text for the whole clip. Thumbnail
/// scenes get a title instead of captions.
pub fn scene_overlays(
    scene: &Scene,
    style: CaptionStyle,
    mode: BurnInMode,
    chars_per_line: usize,
) -> Vec<TextOverlay> {
    let text = scene.text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let styled = |s: &str| {
        if style.uppercase() {
            s.to_uppercase()
        } else {
            s.to_string()
        }
    };

    if scene.is_thumbnail {
        return vec![TextOverlay {
            kind: OverlayKind::Title,
            lines: wrap_lines(&styled(text), chars_per_line),
            window: None,
        }];
    }

    if !scene.shows_captions() {
        return Vec::new();
    }

    match mode {
        BurnInMode::Static => vec![TextOverlay {
            kind: OverlayKind::Caption,
            lines: wrap_lines(&styled(text), chars_per_line),
            window: None,
        }],
        BurnInMode::Segmented => segments_for_scene(scene)
            .into_iter()
            .map(|segment| TextOverlay {
                kind: OverlayKind::Caption,
                lines: wrap_lines(&styled(&segment.text), chars_per_line),
                window: Some((segment.start, segment.end)),
            })
            .collect(),
    }
}

// =============================================================================
// Clip Plan
// =============================================================================

/// Everything needed to encode one scene clip
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPlan {
    pub index: usize,
    pub scene_id: SceneId,
    pub duration_sec: TimeSec,
    pub visual: VisualSource,
    pub audio: AudioSource,
    pub motion: MotionType,
    /// Narration multiplier; values above 1.0 boost
    pub narration_gain: f64,
    pub style: CaptionStyle,
    pub overlays: Vec<TextOverlay>,
    pub output: PathBuf,
}

impl ClipPlan {
    /// Plan for the scene at `index`, starting from placeholder visuals and
    /// silence until fetched assets are attached.
    pub fn for_scene(
        index: usize,
        scene: &Scene,
        timeline: &Timeline,
        settings: &ExportSettings,
        output: PathBuf,
    ) -> Self {
        Self {
            index,
            scene_id: scene.id.clone(),
            duration_sec: scene.duration_sec,
            visual: VisualSource::Placeholder(Color::from_hex(&settings.placeholder_color)),
            audio: AudioSource::Silence,
            motion: scene.motion,
            narration_gain: timeline.narration_gain,
            style: timeline.caption_style,
            overlays: scene_overlays(
                scene,
                timeline.caption_style,
                settings.caption_mode,
                settings.caption_chars_per_line,
            ),
            output,
        }
    }

    pub fn with_visual(mut self, visual: VisualSource) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_audio(mut self, audio: AudioSource) -> Self {
        self.audio = audio;
        self
    }

    /// FFmpeg arguments producing a clip of exactly `duration_sec`
    pub fn to_ffmpeg_args(&self, settings: &ExportSettings) -> Vec<String> {
        let dur = format_time(self.duration_sec);
        let mut args = Vec::new();

        // Input 0: video
        match &self.visual {
            VisualSource::Image(path) => {
                args.extend([
                    "-loop".to_string(),
                    "1".to_string(),
                    "-framerate".to_string(),
                    settings.fps.to_string(),
                    "-t".to_string(),
                    dur.clone(),
                    "-i".to_string(),
                    path.to_string_lossy().to_string(),
                ]);
            }
            VisualSource::Placeholder(color) => {
                args.extend([
                    "-f".to_string(),
                    "lavfi".to_string(),
                    "-t".to_string(),
                    dur.clone(),
                    "-i".to_string(),
                    format!(
                        "color=c={}:s={}x{}:r={}",
                        color.to_ffmpeg(),
                        settings.width,
                        settings.height,
                        settings.fps
                    ),
                ]);
            }
        }

        // Input 1: audio
        match &self.audio {
            AudioSource::Narration(path) => {
                args.extend(["-i".to_string(), path.to_string_lossy().to_string()]);
            }
            AudioSource::Silence => {
                args.extend([
                    "-f".to_string(),
                    "lavfi".to_string(),
                    "-t".to_string(),
                    dur.clone(),
                    "-i".to_string(),
                    format!(
                        "anullsrc=channel_layout=stereo:sample_rate={}",
                        AUDIO_SAMPLE_RATE
                    ),
                ]);
            }
        }

        args.push("-filter_complex".to_string());
        args.push(format!(
            "{};{}",
            self.video_filter(settings),
            self.audio_filter()
        ));

        args.extend([
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            "[a]".to_string(),
            "-c:v".to_string(),
            settings.video_encoder().to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            settings.crf.to_string(),
            "-r".to_string(),
            settings.fps.to_string(),
        ]);
        args.extend(audio_codec_args(settings));
        args.extend([
            "-t".to_string(),
            dur,
            "-y".to_string(),
            self.output.to_string_lossy().to_string(),
        ]);

        args
    }

    fn video_filter(&self, settings: &ExportSettings) -> String {
        let (w, h) = (settings.width, settings.height);
        let mut chain = vec![
            format!("scale={}:{}:force_original_aspect_ratio=increase", w, h),
            format!("crop={}:{}", w, h),
            "setsar=1".to_string(),
        ];

        if matches!(self.visual, VisualSource::Image(_)) && self.motion != MotionType::None {
            chain.push(zoompan_filter(
                self.motion,
                self.duration_sec,
                settings.fps,
                w,
                h,
            ));
        }

        for overlay in &self.overlays {
            chain.push(drawtext_filter(overlay, self.style, h));
        }

        chain.push("format=yuv420p".to_string());
        format!("[0:v]{}[v]", chain.join(","))
    }

    fn audio_filter(&self) -> String {
        let dur = format_time(self.duration_sec);
        match self.audio {
            AudioSource::Narration(_) => format!(
                "[1:a]aresample={rate},aformat=channel_layouts=stereo,volume={gain:.3},apad,atrim=0:{dur},asetpts=N/SR/TB[a]",
                rate = AUDIO_SAMPLE_RATE,
                gain = self.narration_gain,
                dur = dur
            ),
            AudioSource::Silence => format!("[1:a]atrim=0:{},asetpts=N/SR/TB[a]", dur),
        }
    }
}

/// Approximates scene motion with `zoompan`, interpolating the transform
/// between its start and end over the clip's frames.
fn zoompan_filter(motion: MotionType, duration_sec: TimeSec, fps: u32, w: u32, h: u32) -> String {
    let start = motion.transform_at(0.0);
    let end = motion.transform_at(1.0);
    let frames = ((duration_sec * fps as f64).round() as u64).max(1);

    let lerp = |a: f64, b: f64| format!("({:.4}+({:.4})*on/{})", a, b - a, frames);

    format!(
        "zoompan=z='{z}':x='(iw-iw/zoom)/2-{tx}*iw/zoom':y='(ih-ih/zoom)/2-{ty}*ih/zoom':d=1:s={w}x{h}:fps={fps}",
        z = lerp(start.scale, end.scale),
        tx = lerp(start.translate_x, end.translate_x),
        ty = lerp(start.translate_y, end.translate_y),
        w = w,
        h = h,
        fps = fps
    )
}

fn drawtext_filter(overlay: &TextOverlay, style: CaptionStyle, frame_height: u32) -> String {
    let (font_size, y) = match overlay.kind {
        OverlayKind::Caption => (
            style.font_size(frame_height),
            format!("h-text_h-h*{:.2}", CAPTION_BOTTOM_MARGIN),
        ),
        OverlayKind::Title => (style.font_size(frame_height) * 2, "(h-text_h)/2".to_string()),
    };

    let mut filter = format!(
        "drawtext=text={}:fontsize={}:fontcolor={}:x=(w-text_w)/2:y={}:line_spacing={}",
        escape_drawtext_value(&overlay.text()),
        font_size,
        style.font_color().to_ffmpeg(),
        y,
        font_size / 4
    );

    if let Some(box_color) = style.box_color() {
        filter.push_str(&format!(
            ":box=1:boxcolor={}:boxborderw={}",
            box_color.to_ffmpeg(),
            font_size / 3
        ));
    }
    if style.border_width() > 0 {
        filter.push_str(&format!(
            ":borderw={}:bordercolor=black",
            style.border_width()
        ));
    }
    if let Some((start, end)) = overlay.window {
        filter.push_str(&format!(
            ":enable='between(t,{},{})'",
            format_time(start),
            format_time(end)
        ));
    }

    filter
}

/// Backslash-escapes `\` and every char in `specials`
fn escape_with(raw: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes literal text for a drawtext `text=` option inside a filtergraph.
///
/// Three parsers unescape in turn: the filtergraph splitter (`[],;` and
/// quotes), the option parser (`:` and quotes) and drawtext's own `%{...}`
/// expansion. Escaping runs in reverse order.
fn escape_drawtext_value(raw: &str) -> String {
    let expansion = escape_with(raw, &['%']);
    let option = escape_with(&expansion, &['\'', ':']);
    escape_with(&option, &['\'', '[', ']', ',', ';'])
}

fn format_time(seconds: TimeSec) -> String {
    format!("{:.3}", seconds.max(0.0))
}

fn audio_codec_args(settings: &ExportSettings) -> Vec<String> {
    vec![
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", settings.audio_bitrate_kbps),
        "-ar".to_string(),
        AUDIO_SAMPLE_RATE.to_string(),
        "-ac".to_string(),
        "2".to_string(),
    ]
}

// =============================================================================
// Concat & Music Mix
// =============================================================================

/// Contents of a concat-demuxer list file, one clip per line in order
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| {
            format!(
                "file '{}'\n",
                clip.to_string_lossy().replace('\'', r"'\''")
            )
        })
        .collect()
}

/// Stream-copies the listed clips into one file
pub fn concat_args(list_path: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_path.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Mixes looped music under the video's own audio track.
///
/// The music input loops forever and `duration=first` ends the mix with the
/// narration track, so short music never truncates the video.
pub fn music_mix_args(
    video: &Path,
    music: &Path,
    volume: f64,
    output: &Path,
    settings: &ExportSettings,
) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-stream_loop".to_string(),
        "-1".to_string(),
        "-i".to_string(),
        music.to_string_lossy().to_string(),
        "-filter_complex".to_string(),
        format!(
            "[1:a]volume={:.3}[bgm];[0:a][bgm]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[a]",
            volume.clamp(0.0, 1.0)
        ),
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "[a]".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
    ];
    args.extend(audio_codec_args(settings));
    args.extend([
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_with(scene: Scene) -> Timeline {
        Timeline::with_scenes("Plan", vec![scene])
    }

    fn plan(scene: Scene, settings: &ExportSettings) -> ClipPlan {
        let timeline = timeline_with(scene);
        ClipPlan::for_scene(
            0,
            &timeline.scenes[0],
            &timeline,
            settings,
            PathBuf::from("/tmp/work/clip_000.mp4"),
        )
    }

    fn filter_complex(args: &[String]) -> &str {
        let pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        &args[pos + 1]
    }

    #[test]
    fn test_placeholder_and_silence_inputs() {
        let settings = ExportSettings::default();
        let args = plan(Scene::new("Hello.", 4.0), &settings).to_ffmpeg_args(&settings);

        assert!(args.contains(&"color=c=0x1A1A1A:s=1080x1920:r=30".to_string()));
        assert!(args.iter().any(|a| a.starts_with("anullsrc=")));

        let t_pos = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "4.000");
        assert_eq!(args.last().unwrap(), "/tmp/work/clip_000.mp4");
    }

    #[test]
    fn test_narration_is_padded_and_gained() {
        let settings = ExportSettings::default();
        let mut timeline = timeline_with(Scene::new("Hello.", 5.0));
        timeline.set_narration_gain(2.0);

        let args = ClipPlan::for_scene(0, &timeline.scenes[0], &timeline, &settings, "out.mp4".into())
            .with_audio(AudioSource::Narration("/tmp/n.mp3".into()))
            .to_ffmpeg_args(&settings);

        let graph = filter_complex(&args);
        assert!(graph.contains("volume=2.000,apad,atrim=0:5.000"));
    }

    #[test]
    fn test_segmented_captions_get_enable_windows() {
        let settings = ExportSettings::default();
        let scene = Scene::new("First part here. Second part follows.", 6.0);
        let overlays = scene_overlays(&scene, CaptionStyle::Classic, BurnInMode::Segmented, 28);

        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].window.unwrap().0, 0.0);
        assert_eq!(overlays[1].window.unwrap().1, 6.0);

        let args = plan(scene, &settings).to_ffmpeg_args(&settings);
        let graph = filter_complex(&args);
        assert_eq!(graph.matches("drawtext=").count(), 2);
        assert!(graph.contains(":enable='between(t,0.000,"));
    }

    #[test]
    fn test_static_captions_use_full_uppercase_text() {
        let scene = Scene::new("hello world, again", 3.0);
        let overlays = scene_overlays(&scene, CaptionStyle::Bold, BurnInMode::Static, 28);

        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].text(), "HELLO WORLD, AGAIN");
        assert!(overlays[0].window.is_none());
    }

    #[test]
    fn test_captions_wrap_to_chars_per_line() {
        let scene = Scene::new("one two three four five six seven eight", 3.0);
        let overlays = scene_overlays(&scene, CaptionStyle::Minimal, BurnInMode::Static, 10);

        assert!(overlays[0].lines.len() > 1);
        assert!(overlays[0].lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_thumbnail_gets_title_and_disabled_captions_get_nothing() {
        let title = scene_overlays(
            &Scene::new("My Story", 2.0).as_thumbnail(),
            CaptionStyle::Classic,
            BurnInMode::Segmented,
            28,
        );
        assert_eq!(title.len(), 1);
        assert_eq!(title[0].kind, OverlayKind::Title);

        let none = scene_overlays(
            &Scene::new("Hidden", 2.0).without_captions(),
            CaptionStyle::Classic,
            BurnInMode::Segmented,
            28,
        );
        assert!(none.is_empty());
        assert!(scene_overlays(&Scene::new("  ", 2.0), CaptionStyle::Classic, BurnInMode::Static, 28)
            .is_empty());
    }

    /// Mirrors libavutil's `av_get_token`: returns the unescaped token and
    /// the rest of the input starting at the terminator.
    fn get_token<'a>(buf: &'a str, term: &str) -> (String, &'a str) {
        let buf = buf.trim_start_matches([' ', '\n', '\t', '\r']);
        let mut out = String::new();
        let mut protected_len = 0;
        let mut chars = buf.char_indices();
        let mut rest = "";
        while let Some((i, c)) = chars.next() {
            if term.contains(c) {
                rest = &buf[i..];
                break;
            }
            match c {
                '\\' => {
                    if let Some((_, next)) = chars.next() {
                        out.push(next);
                    }
                    protected_len = out.len();
                }
                '\'' => {
                    for (_, q) in chars.by_ref() {
                        if q == '\'' {
                            break;
                        }
                        out.push(q);
                    }
                    protected_len = out.len();
                }
                _ => out.push(c),
            }
        }
        while out.len() > protected_len && out.ends_with([' ', '\n', '\t', '\r']) {
            out.pop();
        }
        (out, rest)
    }

    /// Splits a filter chain into `name=args` filters the way the
    /// filtergraph parser does, dropping link labels.
    fn parse_chain(graph: &str) -> Vec<(String, String)> {
        let mut filters = Vec::new();
        let mut rest = graph;
        loop {
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped.find(']').unwrap();
                rest = &stripped[close + 1..];
            }
            if rest.is_empty() {
                break;
            }
            let name_end = rest.find(|c: char| "=[],;".contains(c)).unwrap_or(rest.len());
            let name = rest[..name_end].to_string();
            rest = &rest[name_end..];
            let mut args = String::new();
            if let Some(stripped) = rest.strip_prefix('=') {
                let (token, after) = get_token(stripped, "[],;");
                args = token;
                rest = after;
            }
            filters.push((name, args));
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped.find(']').unwrap();
                rest = &stripped[close + 1..];
            }
            match rest.chars().next() {
                Some(',') | Some(';') => rest = &rest[1..],
                None => break,
                Some(other) => panic!("stray {:?} in filtergraph at {:?}", other, rest),
            }
        }
        filters
    }

    /// Splits filter args into options the way the option parser does
    fn parse_options(args: &str) -> Vec<(String, String)> {
        let mut options = Vec::new();
        let mut rest = args;
        while !rest.is_empty() {
            let eq = rest.find('=').unwrap();
            let key = rest[..eq].to_string();
            let (value, after) = get_token(&rest[eq + 1..], ":");
            options.push((key, value));
            rest = after.strip_prefix(':').unwrap_or(after);
        }
        options
    }

    fn unescape_expansion(value: &str) -> String {
        let mut out = String::new();
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => out.extend(chars.next()),
                _ => out.push(c),
            }
        }
        out
    }

    fn option<'a>(options: &'a [(String, String)], key: &str) -> &'a str {
        options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_drawtext_text_survives_filtergraph_parsing() {
        let raw = "100% done: it's here, [ok]; back\\slash %{pts}";
        let overlay = TextOverlay {
            kind: OverlayKind::Caption,
            lines: vec![raw.to_string()],
            window: Some((0.0, 2.5)),
        };
        let filter = drawtext_filter(&overlay, CaptionStyle::Minimal, 1920);

        let filters = parse_chain(&filter);
        assert_eq!(filters.len(), 1, "filter split apart: {:?}", filters);
        assert_eq!(filters[0].0, "drawtext");

        let options = parse_options(&filters[0].1);
        assert_eq!(unescape_expansion(option(&options, "text")), raw);
        assert_eq!(option(&options, "enable"), "between(t,0.000,2.500)");
        assert_eq!(option(&options, "x"), "(w-text_w)/2");
    }

    #[test]
    fn test_apostrophes_keep_clip_graph_intact() {
        let settings = ExportSettings::default();
        let scene = Scene::new("It's here. Don't stop.", 5.0);
        let args = plan(scene, &settings).to_ffmpeg_args(&settings);

        let filters = parse_chain(filter_complex(&args));
        let drawtexts: Vec<_> = filters.iter().filter(|(name, _)| name == "drawtext").collect();
        assert_eq!(drawtexts.len(), 2);

        let first = parse_options(&drawtexts[0].1);
        assert_eq!(unescape_expansion(option(&first, "text")), "It's here.");
        assert!(option(&first, "enable").starts_with("between(t,0.000,"));

        let second = parse_options(&drawtexts[1].1);
        assert_eq!(unescape_expansion(option(&second, "text")), "Don't stop.");

        let names: Vec<_> = filters.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names.first(), Some(&"scale"));
        assert!(names.contains(&"format"));
        assert!(names.contains(&"asetpts"));
    }

    #[test]
    fn test_motion_only_applies_to_images() {
        let settings = ExportSettings::default();
        let scene = Scene::new("Zoom.", 2.0).with_motion(MotionType::ZoomIn);

        let placeholder = plan(scene.clone(), &settings).to_ffmpeg_args(&settings);
        assert!(!filter_complex(&placeholder).contains("zoompan"));

        let image = plan(scene, &settings)
            .with_visual(VisualSource::Image("/tmp/i.png".into()))
            .to_ffmpeg_args(&settings);
        let graph = filter_complex(&image);
        assert!(graph.contains("zoompan=z='(1.0000+(0.2000)*on/60)'"));
        assert!(image.contains(&"-loop".to_string()));
    }

    #[test]
    fn test_concat_list_keeps_order_and_escapes_quotes() {
        let list = concat_list(&[
            PathBuf::from("/w/clip_000.mp4"),
            PathBuf::from("/w/it's.mp4"),
        ]);
        assert_eq!(list, "file '/w/clip_000.mp4'\nfile '/w/it'\\''s.mp4'\n");
    }

    #[test]
    fn test_music_mix_ends_with_first_stream() {
        let settings = ExportSettings::default();
        let args = music_mix_args(
            Path::new("/w/concat.mp4"),
            Path::new("/w/music.mp3"),
            0.25,
            Path::new("/w/final.mp4"),
            &settings,
        );

        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "-1");
        assert_eq!(args[loop_pos + 3], "/w/music.mp3");

        let graph = filter_complex(&args);
        assert!(graph.contains("volume=0.250"));
        assert!(graph.contains("amix=inputs=2:duration=first"));
        assert!(!args.contains(&"-shortest".to_string()));
    }
}
