//! Sound Catalog
//!
//! The fixed set of sound assets used by the sculpture, grouped per game.
//! Every sound has a logical path such as `mole/success` or
//! `simon/panels/2/9`.

use crate::asset::AssetLoader;
use crate::engine::{AudioContext, VoiceId};
use crate::game::{PanelKey, PANELS_PER_STRIP, STRIP_COUNT};
use crate::sound::{Sound, SoundParams, VcfSound};
use crate::{AudioError, Result};
use log::info;
use rayon::prelude::*;

/// Per-panel tones indexed `[strip][panel]`
pub type PanelGrid = Vec<Vec<Sound>>;

/// Alone (handshake) mode sounds
#[derive(Debug)]
pub struct AloneSounds {
    /// Filtered ambient pulse loop
    pub ambient: VcfSound,
    /// Handshake confirmation
    pub handshake: Sound,
}

/// Mole game sounds
#[derive(Debug)]
pub struct MoleSounds {
    /// Target hit
    pub success: Sound,
    /// Wrong panel
    pub failure: Sound,
    /// Panel lit tones
    pub panels: PanelGrid,
}

/// Disk game sounds
#[derive(Debug)]
pub struct DiskSounds {
    /// Breathing ambience loop
    pub ambient: Sound,
    /// Reference disk loop
    pub loop_ref: Sound,
    /// Distance-tracking disk loop
    pub distance: Sound,
    /// Light effect
    pub lighteffect: Sound,
    /// Level won
    pub success: Sound,
    /// Final show
    pub show: Sound,
}

/// Simon game sounds
#[derive(Debug)]
pub struct SimonSounds {
    /// Panel tones
    pub panels: PanelGrid,
    /// Level won
    pub success: Sound,
    /// Wrong panel
    pub failure: Sound,
    /// All levels won
    pub show: Sound,
}

/// Every sound the sculpture can play
#[derive(Debug)]
pub struct SoundCatalog {
    /// Alone mode
    pub alone: AloneSounds,
    /// Mole game
    pub mole: MoleSounds,
    /// Disk game
    pub disk: DiskSounds,
    /// Simon game
    pub simon: SimonSounds,
}

impl SoundCatalog {
    /// Build the catalog with unloaded sounds
    pub fn new(ctx: &AudioContext) -> Result<Self> {
        let one_shot = |url: &str| Sound::new(ctx, url, SoundParams::new());

        Ok(SoundCatalog {
            alone: AloneSounds {
                ambient: VcfSound::new(
                    ctx,
                    "sounds/Alone_Mode/Pulse_Amb_Loop.wav",
                    SoundParams::new().fade_in(3.0),
                )?,
                handshake: one_shot("sounds/Alone_Mode/Hand_Shake_01.wav")?,
            },
            mole: MoleSounds {
                success: one_shot("sounds/Game_01/G01_Success_01.wav")?,
                failure: one_shot("sounds/Game_01/G01_Negative_01.wav")?,
                panels: panel_grid(ctx, "Game_01", "G01")?,
            },
            disk: DiskSounds {
                ambient: Sound::new(
                    ctx,
                    "sounds/Game_02/G02_Amb_Breath_Loop_01.wav",
                    SoundParams::new().looping(true),
                )?,
                loop_ref: Sound::new(
                    ctx,
                    "sounds/Game_02/G02_Disk_Loop_Ref_01.wav",
                    SoundParams::new()
                        .looping(true)
                        .rate(2.0)
                        .gain(0.3)
                        .fade_in(10.0),
                )?,
                distance: Sound::new(
                    ctx,
                    "sounds/Game_02/G02_Disk_Loop_01.wav",
                    SoundParams::new()
                        .looping(true)
                        .rate(2.0)
                        .gain(0.5)
                        .fade_in(10.0),
                )?,
                lighteffect: one_shot("sounds/Game_02/G02_Lights_01.wav")?,
                success: one_shot("sounds/Game_02/G02_Success_01.wav")?,
                show: one_shot("sounds/Game_02/G02_Success_final_01.wav")?,
            },
            simon: SimonSounds {
                panels: panel_grid(ctx, "Game_03", "G03")?,
                success: one_shot("sounds/Game_03/G03_Success_01.wav")?,
                failure: one_shot("sounds/Game_03/G03_Negative_01.wav")?,
                show: one_shot("sounds/Game_03/G03_Light_Show_01.wav")?,
            },
        })
    }

    /// Load every sound in parallel
    ///
    /// Returns the number of sounds loaded. Fails if any asset fails.
    pub fn load_all(&mut self, loader: &dyn AssetLoader) -> Result<usize> {
        let mut sounds = self.sounds_mut();
        let count = sounds.len();
        info!("Loading {} sounds", count);
        sounds
            .par_iter_mut()
            .try_for_each(|sound| sound.load(loader))?;
        info!("Loaded {} sounds", count);
        Ok(count)
    }

    /// Number of sounds
    pub fn len(&self) -> usize {
        self.sounds().len()
    }

    /// True when the catalog holds no sounds
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every sound has been loaded
    pub fn is_loaded(&self) -> bool {
        self.sounds().iter().all(|(_, sound)| sound.is_loaded())
    }

    /// Every sound with its logical path
    pub fn sounds(&self) -> Vec<(String, &Sound)> {
        let mut out = vec![
            ("alone/ambient".to_string(), self.alone.ambient.sound()),
            ("alone/handshake".to_string(), &self.alone.handshake),
            ("mole/success".to_string(), &self.mole.success),
            ("mole/failure".to_string(), &self.mole.failure),
        ];
        push_grid(&mut out, "mole", &self.mole.panels);
        out.extend([
            ("disk/ambient".to_string(), &self.disk.ambient),
            ("disk/loop".to_string(), &self.disk.loop_ref),
            ("disk/distance".to_string(), &self.disk.distance),
            ("disk/lighteffect".to_string(), &self.disk.lighteffect),
            ("disk/success".to_string(), &self.disk.success),
            ("disk/show".to_string(), &self.disk.show),
        ]);
        push_grid(&mut out, "simon", &self.simon.panels);
        out.extend([
            ("simon/success".to_string(), &self.simon.success),
            ("simon/failure".to_string(), &self.simon.failure),
            ("simon/show".to_string(), &self.simon.show),
        ]);
        out
    }

    /// Look up a sound by logical path
    pub fn find(&self, path: &str) -> Option<&Sound> {
        let path = path.trim_matches('/');
        self.sounds()
            .into_iter()
            .find(|(p, _)| p == path)
            .map(|(_, sound)| sound)
    }

    /// Play a sound by logical path
    pub fn play(&self, path: &str) -> Result<VoiceId> {
        let path = path.trim_matches('/');
        if path == "alone/ambient" {
            return self.alone.ambient.play();
        }
        self.find(path)
            .ok_or_else(|| AudioError::InvalidSound(format!("Unknown sound path '{}'", path)))?
            .play()
    }

    /// Mole panel tone
    pub fn mole_panel(&self, key: PanelKey) -> Option<&Sound> {
        grid_get(&self.mole.panels, key)
    }

    /// Simon panel tone
    pub fn simon_panel(&self, key: PanelKey) -> Option<&Sound> {
        grid_get(&self.simon.panels, key)
    }

    fn sounds_mut(&mut self) -> Vec<&mut Sound> {
        let SoundCatalog {
            alone,
            mole,
            disk,
            simon,
        } = self;

        let mut out: Vec<&mut Sound> = vec![
            alone.ambient.sound_mut(),
            &mut alone.handshake,
            &mut mole.success,
            &mut mole.failure,
        ];
        out.extend(mole.panels.iter_mut().flatten());
        out.extend([
            &mut disk.ambient,
            &mut disk.loop_ref,
            &mut disk.distance,
            &mut disk.lighteffect,
            &mut disk.success,
            &mut disk.show,
        ]);
        out.extend(simon.panels.iter_mut().flatten());
        out.extend([&mut simon.success, &mut simon.failure, &mut simon.show]);
        out
    }
}

/// Asset url of a panel tone; panels are numbered 01-30 across strips
fn panel_url(dir: &str, prefix: &str, strip: usize, panel: usize) -> String {
    format!(
        "sounds/{}/{}_LED_{:02}.wav",
        dir,
        prefix,
        strip * PANELS_PER_STRIP + panel + 1
    )
}

fn panel_grid(ctx: &AudioContext, dir: &str, prefix: &str) -> Result<PanelGrid> {
    (0..STRIP_COUNT)
        .map(|strip| {
            (0..PANELS_PER_STRIP)
                .map(|panel| Sound::new(ctx, panel_url(dir, prefix, strip, panel), SoundParams::new()))
                .collect::<Result<Vec<Sound>>>()
        })
        .collect()
}

fn push_grid<'a>(out: &mut Vec<(String, &'a Sound)>, game: &str, grid: &'a PanelGrid) {
    for (strip, row) in grid.iter().enumerate() {
        for (panel, sound) in row.iter().enumerate() {
            out.push((format!("{}/panels/{}/{}", game, strip, panel), sound));
        }
    }
}

fn grid_get(grid: &PanelGrid, key: PanelKey) -> Option<&Sound> {
    grid.get(key.strip)?.get(key.panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryLoader;
    use crate::sound::tests::dc_loader;

    #[test]
    fn test_panel_url_numbering() {
        assert_eq!(panel_url("Game_01", "G01", 0, 0), "sounds/Game_01/G01_LED_01.wav");
        assert_eq!(panel_url("Game_03", "G03", 2, 9), "sounds/Game_03/G03_LED_30.wav");
        assert_eq!(panel_url("Game_01", "G01", 1, 0), "sounds/Game_01/G01_LED_11.wav");
    }

    #[test]
    fn test_catalog_contents() {
        let ctx = AudioContext::new(44_100, 2).unwrap();
        let catalog = SoundCatalog::new(&ctx).unwrap();

        assert_eq!(catalog.len(), 73);
        assert!(!catalog.is_empty());
        assert!(!catalog.is_loaded());

        let ambient = catalog.find("alone/ambient").unwrap();
        assert!(ambient.params().looping);
        assert_eq!(ambient.params().fade_in, 3.0);
        assert_eq!(ambient.params().fade_out, 3.0);

        let disk_loop = catalog.find("/disk/loop/").unwrap();
        assert_eq!(disk_loop.params().rate, 2.0);
        assert_eq!(disk_loop.params().gain, 0.3);

        let tone = catalog.find("simon/panels/1/4").unwrap();
        assert_eq!(tone.name(), "G03_LED_15");
        assert_eq!(
            catalog.simon_panel(PanelKey::new(1, 4)).unwrap().url(),
            tone.url()
        );
        assert!(catalog.mole_panel(PanelKey::new(3, 0)).is_none());
        assert!(catalog.find("disk/missing").is_none());
    }

    #[test]
    fn test_load_all() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let mut catalog = SoundCatalog::new(&ctx).unwrap();

        assert_eq!(catalog.load_all(&dc_loader()).unwrap(), 73);
        assert!(catalog.is_loaded());
    }

    #[test]
    fn test_play_by_path() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let mut catalog = SoundCatalog::new(&ctx).unwrap();
        catalog.load_all(&dc_loader()).unwrap();

        catalog.play("disk/loop").unwrap();
        catalog.play("alone/ambient").unwrap();
        assert_eq!(
            ctx.active_voices(),
            vec!["G02_Disk_Loop_Ref_01".to_string(), "Pulse_Amb_Loop".to_string()]
        );
        assert!(matches!(
            catalog.play("mole/panels/9/9"),
            Err(AudioError::InvalidSound(_))
        ));
    }

    #[test]
    fn test_load_all_reports_missing_asset() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let mut catalog = SoundCatalog::new(&ctx).unwrap();

        assert!(catalog.load_all(&MemoryLoader::new()).is_err());
    }
}
