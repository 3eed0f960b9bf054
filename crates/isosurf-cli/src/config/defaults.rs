use isosurf::engine::config::SurfacePhase;

pub struct DefaultsConfig {
    pub isovalue: f64,
    pub phase: SurfacePhase,
    pub upsample: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            isovalue: 0.02,
            phase: SurfacePhase::Auto,
            upsample: false,
        }
    }
}
