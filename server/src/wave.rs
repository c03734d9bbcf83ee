//! Wave composition: which enemies spawn in a wave, and when.
//!
//! Composition is a pure function of the wave number, so the same wave
//! always produces the same ordered spawn schedule.

use shared::EnemyKind;

const MID_WAVE_CYCLE: [EnemyKind; 4] = [
    EnemyKind::Fast,
    EnemyKind::Fast,
    EnemyKind::Tank,
    EnemyKind::Flying,
];

const LATE_WAVE_CYCLE: [EnemyKind; 5] = [
    EnemyKind::Fast,
    EnemyKind::Tank,
    EnemyKind::Tank,
    EnemyKind::Flying,
    EnemyKind::Flying,
];

/// One scheduled spawn, `offset` seconds after the wave starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnEntry {
    pub kind: EnemyKind,
    pub offset: f32,
}

pub fn enemy_count(wave: u32) -> usize {
    5 + 2 * wave as usize
}

/// Archetype of the `index`-th spawn in `wave`.
pub fn kind_for(wave: u32, index: usize) -> EnemyKind {
    match wave {
        0..=2 => {
            if index % 3 == 0 {
                EnemyKind::Tank
            } else {
                EnemyKind::Fast
            }
        }
        3..=5 => MID_WAVE_CYCLE[index % MID_WAVE_CYCLE.len()],
        _ => LATE_WAVE_CYCLE[index % LATE_WAVE_CYCLE.len()],
    }
}

/// Ordered spawn schedule for `wave`, evenly spaced by `spawn_interval`.
pub fn composition(wave: u32, spawn_interval: f32) -> Vec<SpawnEntry> {
    (0..enemy_count(wave))
        .map(|i| SpawnEntry {
            kind: kind_for(wave, i),
            offset: i as f32 * spawn_interval,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn count(entries: &[SpawnEntry], kind: EnemyKind) -> usize {
        entries.iter().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn test_first_wave_composition() {
        let wave = composition(1, 1.5);
        assert_eq!(wave.len(), 7);
        assert_eq!(count(&wave, EnemyKind::Tank), 3);
        assert_eq!(count(&wave, EnemyKind::Fast), 4);
        assert_eq!(count(&wave, EnemyKind::Flying), 0);
        assert_eq!(wave[0].kind, EnemyKind::Tank);
        assert_eq!(wave[1].kind, EnemyKind::Fast);
    }

    #[test]
    fn test_offsets_are_evenly_spaced() {
        let wave = composition(3, 1.5);
        for (i, entry) in wave.iter().enumerate() {
            assert_approx_eq!(entry.offset, i as f32 * 1.5, 1e-5);
        }
    }

    #[test]
    fn test_count_grows_with_wave() {
        assert_eq!(enemy_count(1), 7);
        assert_eq!(enemy_count(4), 13);
        assert_eq!(enemy_count(10), 25);
    }

    #[test]
    fn test_mix_shifts_across_bands() {
        let mid = composition(4, 1.5);
        assert!(count(&mid, EnemyKind::Flying) > 0);
        assert_eq!(mid[0].kind, EnemyKind::Fast);
        assert_eq!(mid[2].kind, EnemyKind::Tank);
        assert_eq!(mid[3].kind, EnemyKind::Flying);

        let late = composition(6, 1.5);
        let heavy = count(&late, EnemyKind::Tank) + count(&late, EnemyKind::Flying);
        assert!(heavy > count(&late, EnemyKind::Fast) * 3);
    }

    #[test]
    fn test_composition_is_pure() {
        for wave in 1..12 {
            assert_eq!(composition(wave, 1.5), composition(wave, 1.5));
        }
    }
}
