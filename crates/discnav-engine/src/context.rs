//! Current title, clip, angle and position bookkeeping.

use discnav_common::{Clip, PlaylistId, StreamEntry, StreamKind, Title};

/// Playback state derived from the package's events.
///
/// Owns the current [`Title`] snapshot. The snapshot is replaced wholesale
/// on title, playlist and angle changes and never mutated in place.
#[derive(Debug, Default)]
pub struct PlaybackContext {
    title: Option<Title>,
    clip_index: Option<usize>,
    playlist: Option<PlaylistId>,
    angle: u32,
    time_ms: u64,
}

impl PlaybackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&Title> {
        self.title.as_ref()
    }

    /// Make `title` current and activate its first clip.
    pub fn set_title(&mut self, title: Title) {
        self.playlist = Some(title.playlist);
        self.clip_index = if title.clips.is_empty() { None } else { Some(0) };
        self.title = Some(title);
    }

    /// Drop the current title and clip. The playlist id is kept for resume.
    pub fn clear_title(&mut self) {
        self.title = None;
        self.clip_index = None;
    }

    pub fn playlist(&self) -> Option<PlaylistId> {
        self.playlist
    }

    pub fn set_playlist(&mut self, playlist: PlaylistId) {
        self.playlist = Some(playlist);
    }

    pub fn angle(&self) -> u32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: u32) {
        self.angle = angle;
    }

    /// Activate the clip at `index`. Out-of-range indices leave the
    /// active clip unchanged and return `false`.
    pub fn select_clip(&mut self, index: usize) -> bool {
        match &self.title {
            Some(title) if index < title.clips.len() => {
                self.clip_index = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn active_clip(&self) -> Option<&Clip> {
        let index = self.clip_index?;
        self.title.as_ref()?.clips.get(index)
    }

    /// Record the position of the next byte about to be read.
    pub fn set_time(&mut self, time_ms: u64) {
        self.time_ms = time_ms;
    }

    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    pub fn total_time_ms(&self) -> u64 {
        self.title.as_ref().map_or(0, |t| t.duration_ms)
    }

    pub fn chapter_count(&self) -> u32 {
        self.title.as_ref().map_or(0, |t| t.chapters.len() as u32)
    }

    /// 1-based chapter containing the current position, 0 without chapters.
    pub fn chapter(&self) -> u32 {
        let Some(title) = &self.title else {
            return 0;
        };
        title
            .chapters
            .iter()
            .rposition(|c| c.start_ms <= self.time_ms)
            .map_or(0, |i| i as u32 + 1)
    }

    /// Start of 1-based chapter `n`, 0 when absent.
    pub fn chapter_position(&self, n: u32) -> u64 {
        if n == 0 {
            return 0;
        }
        self.title
            .as_ref()
            .and_then(|t| t.chapters.get(n as usize - 1))
            .map_or(0, |c| c.start_ms)
    }

    /// Language of stream `index` in the active clip's `kind` table.
    pub fn stream_language(&self, kind: StreamKind, index: usize) -> Option<&str> {
        self.active_clip()?
            .streams(kind)
            .get(index)
            .map(|s| s.language.as_str())
    }

    /// Look a PID up across all of the active clip's stream tables.
    pub fn find_stream(&self, pid: u16) -> Option<(StreamKind, &StreamEntry)> {
        self.active_clip()?.find_pid(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: &str, audio: &[(u16, &str)]) -> Clip {
        Clip {
            clip_id: id.to_string(),
            audio_streams: audio
                .iter()
                .map(|&(pid, lang)| StreamEntry {
                    pid,
                    coding: "ac3".to_string(),
                    language: lang.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn feature() -> Title {
        Title::new(PlaylistId(10), 5_400_000)
            .with_chapter_marks(&[0, 1_800_000, 3_600_000])
            .with_clip(clip("00001", &[(0x1100, "eng"), (0x1101, "fra")]))
            .with_clip(clip("00002", &[(0x1100, "deu")]))
    }

    #[test]
    fn test_empty_context() {
        let ctx = PlaybackContext::new();
        assert!(ctx.title().is_none());
        assert!(ctx.active_clip().is_none());
        assert_eq!(ctx.chapter(), 0);
        assert_eq!(ctx.chapter_count(), 0);
        assert_eq!(ctx.chapter_position(1), 0);
        assert_eq!(ctx.total_time_ms(), 0);
    }

    #[test]
    fn test_chapter_from_time() {
        let mut ctx = PlaybackContext::new();
        ctx.set_title(feature());
        assert_eq!(ctx.chapter_count(), 3);
        assert_eq!(ctx.chapter(), 1);

        ctx.set_time(1_800_000);
        assert_eq!(ctx.chapter(), 2);
        ctx.set_time(5_000_000);
        assert_eq!(ctx.chapter(), 3);
    }

    #[test]
    fn test_chapter_position_range() {
        let mut ctx = PlaybackContext::new();
        ctx.set_title(feature());
        assert_eq!(ctx.chapter_position(0), 0);
        assert_eq!(ctx.chapter_position(2), 1_800_000);
        assert_eq!(ctx.chapter_position(3), 3_600_000);
        assert_eq!(ctx.chapter_position(4), 0);
        assert_eq!(ctx.chapter_position(u32::MAX), 0);
    }

    #[test]
    fn test_select_clip_ignores_out_of_range() {
        let mut ctx = PlaybackContext::new();
        assert!(!ctx.select_clip(0));

        ctx.set_title(feature());
        assert_eq!(ctx.active_clip().unwrap().clip_id, "00001");
        assert!(ctx.select_clip(1));
        assert!(!ctx.select_clip(2));
        assert_eq!(ctx.active_clip().unwrap().clip_id, "00002");
    }

    #[test]
    fn test_stream_lookup_uses_active_clip() {
        let mut ctx = PlaybackContext::new();
        ctx.set_title(feature());
        assert_eq!(ctx.stream_language(StreamKind::Audio, 1), Some("fra"));
        assert_eq!(ctx.stream_language(StreamKind::Audio, 2), None);
        assert_eq!(ctx.stream_language(StreamKind::Subtitle, 0), None);

        let (kind, entry) = ctx.find_stream(0x1101).unwrap();
        assert_eq!(kind, StreamKind::Audio);
        assert_eq!(entry.language, "fra");

        ctx.select_clip(1);
        assert_eq!(ctx.stream_language(StreamKind::Audio, 0), Some("deu"));
        assert!(ctx.find_stream(0x1101).is_none());
    }

    #[test]
    fn test_clear_title_keeps_playlist() {
        let mut ctx = PlaybackContext::new();
        ctx.set_title(feature());
        ctx.clear_title();
        assert!(ctx.title().is_none());
        assert!(ctx.active_clip().is_none());
        assert_eq!(ctx.playlist(), Some(PlaylistId(10)));
    }
}
