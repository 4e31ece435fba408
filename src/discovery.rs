use clap::ValueEnum;
use serde::Deserialize;

use crate::media::MediaTarget;

pub trait Node: Clone {
    type Media: MediaTarget + Clone + PartialEq;

    fn children(&self) -> Vec<Self>;

    fn shadow_children(&self) -> Option<Vec<Self>>;

    fn media(&self) -> Option<Self::Media>;
}

/// Collects every media-capable node under `root` (inclusive) in document order.
///
/// A node comes before its shadow tree, and its shadow tree before its light children.
/// Media nested inside other media-capable nodes is still reported.
pub fn find_media<N: Node>(root: &N) -> Vec<N::Media> {
    let mut found = Vec::new();
    let mut pending = vec![root.clone()];
    while let Some(node) = pending.pop() {
        if let Some(media) = node.media() {
            found.push(media);
        }
        pending.extend(node.children().into_iter().rev());
        if let Some(shadow) = node.shadow_children() {
            pending.extend(shadow.into_iter().rev());
        }
    }
    log::trace!("Found {} media element(s)", found.len());
    found
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPolicy {
    #[default]
    PlayingThenRecent,
    RecentThenPlaying,
    First,
}

pub fn get_target_media<N: Node>(
    root: &N,
    policy: TargetPolicy,
    last_interacted: Option<&N::Media>,
) -> Option<N::Media> {
    let media = find_media(root);
    let playing = || media.iter().find(|candidate| !candidate.is_paused());
    let recent = || last_interacted.and_then(|last| media.iter().find(|candidate| *candidate == last));

    let preferred = match policy {
        TargetPolicy::PlayingThenRecent => playing().or_else(recent),
        TargetPolicy::RecentThenPlaying => recent().or_else(playing),
        TargetPolicy::First => None,
    };
    preferred.or_else(|| media.first()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, ElementSpec, MediaState, ShadowMode};

    fn ids(media: &[crate::dom::MediaElement]) -> Vec<String> {
        media
            .iter()
            .map(|m| m.id().unwrap_or_default().to_string())
            .collect()
    }

    fn playing() -> MediaState {
        MediaState {
            paused: false,
            ..MediaState::default()
        }
    }

    #[test]
    fn should_find_media_at_mixed_depths() {
        // given
        let doc = Document::new(vec![ElementSpec::new("div")
            .child(ElementSpec::new("video").id("v1"))
            .child(ElementSpec::new("audio").id("a1"))
            .child(ElementSpec::new("div").id("nested").child(ElementSpec::new("video").id("v2")))]);

        // when
        let media = find_media(&doc.root());

        // then
        let mut found = ids(&media);
        found.sort();
        assert_eq!(found, vec!["a1", "v1", "v2"]);
    }

    #[test]
    fn should_report_document_order() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("div").child(ElementSpec::new("video").id("first")),
            ElementSpec::new("audio").id("second"),
        ]);

        // then
        assert_eq!(ids(&find_media(&doc.root())), vec!["first", "second"]);
    }

    #[test]
    fn should_enter_open_shadow_roots() {
        // given
        let doc = Document::new(vec![ElementSpec::new("custom-player")
            .shadow(
                ShadowMode::Open,
                vec![ElementSpec::new("div").child(ElementSpec::new("video").id("inner"))],
            )
            .child(ElementSpec::new("audio").id("light"))]);

        // then
        assert_eq!(ids(&find_media(&doc.root())), vec!["inner", "light"]);
    }

    #[test]
    fn should_skip_closed_shadow_roots() {
        // given
        let doc = Document::new(vec![ElementSpec::new("custom-player").shadow(
            ShadowMode::Closed,
            vec![ElementSpec::new("video").id("hidden")],
        )]);

        // then
        assert!(find_media(&doc.root()).is_empty());
    }

    #[test]
    fn should_include_media_nested_in_media() {
        // given
        let doc = Document::new(vec![ElementSpec::new("video")
            .id("outer")
            .child(ElementSpec::new("div").media(MediaState::default()).id("inner"))]);

        // then
        assert_eq!(ids(&find_media(&doc.root())), vec!["outer", "inner"]);
    }

    #[test]
    fn should_ignore_plain_elements() {
        let doc = Document::new(vec![ElementSpec::new("div").child(ElementSpec::new("img"))]);
        assert!(find_media(&doc.root()).is_empty());
        assert!(get_target_media(&doc.root(), TargetPolicy::default(), None).is_none());
    }

    #[test]
    fn should_prefer_playing_media() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("video").id("idle"),
            ElementSpec::new("video").id("active").media(playing()),
        ]);

        // when
        let target = get_target_media(&doc.root(), TargetPolicy::PlayingThenRecent, None);

        // then
        assert_eq!(target.unwrap().id(), Some("active"));
    }

    #[test]
    fn should_prefer_recent_media_when_nothing_plays() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("video").id("a"),
            ElementSpec::new("video").id("b"),
        ]);
        let recent = doc.media_by_id("b").unwrap();

        // when
        let target = get_target_media(&doc.root(), TargetPolicy::PlayingThenRecent, Some(&recent));

        // then
        assert_eq!(target.unwrap().id(), Some("b"));
    }

    #[test]
    fn should_rank_recent_above_playing_when_configured() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("video").id("a").media(playing()),
            ElementSpec::new("video").id("b"),
        ]);
        let recent = doc.media_by_id("b").unwrap();

        // then
        let target = get_target_media(&doc.root(), TargetPolicy::RecentThenPlaying, Some(&recent));
        assert_eq!(target.unwrap().id(), Some("b"));
        let target = get_target_media(&doc.root(), TargetPolicy::PlayingThenRecent, Some(&recent));
        assert_eq!(target.unwrap().id(), Some("a"));
    }

    #[test]
    fn should_fall_back_to_first_media() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("audio").id("a"),
            ElementSpec::new("video").id("b").media(playing()),
        ]);
        let other = Document::new(vec![ElementSpec::new("video").id("gone")]);
        let stale = other.media_by_id("gone").unwrap();

        // then
        let target = get_target_media(&doc.root(), TargetPolicy::First, None);
        assert_eq!(target.unwrap().id(), Some("a"));
        let target = get_target_media(&doc.root(), TargetPolicy::RecentThenPlaying, Some(&stale));
        assert_eq!(target.unwrap().id(), Some("b"));
    }
}
