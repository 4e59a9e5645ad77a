//! Intent-to-motion selection over whatever clips the loaded asset has.
//!
//! Group matching is deliberately duck-typed: a static keyword table is
//! scanned against the asset's group names, so any model whose groups are
//! named in the spirit of "wave_hello" or "nod_agree" works without
//! per-model branches. When nothing matches, a random group keeps the
//! avatar moving rather than frozen.

use crate::avatar::{AvatarSurface, MotionPriority, StartedMotion};
use crate::intent::Intent;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Ordered keyword fragments per intent, scanned against group names.
const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["greet", "greeting", "hello", "wave"]),
    (Intent::Thanks, &["thank", "bow", "nod"]),
    (Intent::Apology, &["sorry", "apolog", "bow"]),
    (Intent::Affirm, &["nod", "agree", "yes", "happy"]),
    (Intent::Negate, &["shake", "deny", "refuse", "sad"]),
    (Intent::Exclaim, &["excit", "surprise", "jump", "happy"]),
    (Intent::Question, &["think", "tilt", "curious", "puzzl"]),
    (Intent::Neutral, &["idle", "talk", "normal"]),
];

fn keywords_for(intent: Intent) -> &'static [&'static str] {
    KEYWORD_TABLE
        .iter()
        .find(|(i, _)| *i == intent)
        .map(|(_, kws)| *kws)
        .unwrap_or(&[])
}

/// Pick a motion group name for `intent` from the available group names.
///
/// First keyword whose fragment substring-matches a group name
/// (case-insensitively) wins; otherwise a uniformly random group; `None`
/// only when no groups exist at all.
pub fn select_group<'a>(
    intent: Intent,
    groups: &'a [String],
    rng: &mut impl Rng,
) -> Option<&'a str> {
    if groups.is_empty() {
        return None;
    }
    for keyword in keywords_for(intent) {
        if let Some(name) = groups
            .iter()
            .find(|g| g.to_lowercase().contains(keyword))
        {
            return Some(name);
        }
    }
    Some(groups[rng.gen_range(0..groups.len())].as_str())
}

/// Classify-and-play: choose a group for `intent` on `surface` and start a
/// random clip from it at the given priority.
///
/// Returns the playback request, or `None` when the asset has no motion
/// groups (a no-op, not an error).
pub fn trigger(
    surface: &Arc<dyn AvatarSurface>,
    intent: Intent,
    priority: MotionPriority,
    rng: &mut impl Rng,
) -> Option<StartedMotion> {
    let groups = surface.motion_groups();
    let names: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();
    let chosen = select_group(intent, &names, rng)?.to_owned();

    let clip_count = groups
        .iter()
        .find(|g| g.name == chosen)
        .map(|g| g.clips.len())
        .unwrap_or(0);
    let clip_index = if clip_count > 1 {
        rng.gen_range(0..clip_count)
    } else {
        0
    };

    debug!("intent {intent:?} -> motion '{chosen}' clip {clip_index}");
    surface.start_motion(&chosen, clip_index, priority);
    Some(StartedMotion {
        group: chosen,
        clip_index,
        priority,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::avatar::{ModelSurface, MotionClip, MotionGroup};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn greeting_selects_wave_hello() {
        let groups = names(&["idle", "wave_hello", "sad"]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            select_group(Intent::Greeting, &groups, &mut rng),
            Some("wave_hello")
        );
    }

    #[test]
    fn keyword_order_breaks_ties() {
        // "greet" is listed before "wave", so a literal greet group wins.
        let groups = names(&["wave_arm", "greet_bow"]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            select_group(Intent::Greeting, &groups, &mut rng),
            Some("greet_bow")
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let groups = names(&["Idle", "Wave_Hello"]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            select_group(Intent::Greeting, &groups, &mut rng),
            Some("Wave_Hello")
        );
    }

    #[test]
    fn no_match_falls_back_to_random_group() {
        let groups = names(&["idle", "talk"]);
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_group(Intent::Greeting, &groups, &mut rng).unwrap();
            assert!(picked == "idle" || picked == "talk");
        }
    }

    #[test]
    fn empty_groups_select_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select_group(Intent::Greeting, &[], &mut rng), None);
    }

    #[test]
    fn trigger_plays_random_clip_at_priority() {
        let surface: Arc<dyn AvatarSurface> = Arc::new(ModelSurface::new(
            vec![],
            vec![MotionGroup {
                name: "wave_hello".to_owned(),
                clips: vec![
                    MotionClip { duration_ms: 900 },
                    MotionClip { duration_ms: 1100 },
                    MotionClip { duration_ms: 1300 },
                ],
            }],
        ));
        let mut rng = StdRng::seed_from_u64(3);
        let started = trigger(&surface, Intent::Greeting, MotionPriority::Normal, &mut rng)
            .unwrap();
        assert_eq!(started.group, "wave_hello");
        assert!(started.clip_index < 3);
        assert_eq!(started.priority, MotionPriority::Normal);
    }

    #[test]
    fn trigger_on_empty_asset_is_noop() {
        let surface: Arc<dyn AvatarSurface> = Arc::new(ModelSurface::new(vec![], vec![]));
        let mut rng = StdRng::seed_from_u64(3);
        assert!(
            trigger(&surface, Intent::Neutral, MotionPriority::Normal, &mut rng).is_none()
        );
    }
}
