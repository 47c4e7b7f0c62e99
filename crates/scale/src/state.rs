//! Simulated instrument state.
//!
//! Fields are private so that every assignment goes through a setter; this is
//! what keeps weight and tare rounded and the piece count non-negative.

/// Round to two decimal places.
///
/// Half-way cases on the scaled value round away from zero. This is the
/// simplified rounding the simulator reports with; it does not try to be
/// metrologically exact.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The mutable record behind the simulated balance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentState {
    weight: f64,
    tare: f64,
    stable: bool,
    piece_count: u64,
    display_text: String,
}

impl InstrumentState {
    /// Create the state with an initial weight and stability flag.
    ///
    /// Tare and piece count start at zero, the display text empty.
    pub fn new(initial_weight: f64, stable: bool) -> Self {
        Self {
            weight: round2(initial_weight),
            tare: 0.0,
            stable,
            piece_count: 0,
            display_text: String::new(),
        }
    }

    /// Gross weight in grams.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Tare value in grams.
    pub fn tare(&self) -> f64 {
        self.tare
    }

    /// Net weight (`weight - tare`), computed on demand.
    pub fn net_weight(&self) -> f64 {
        self.weight - self.tare
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn piece_count(&self) -> u64 {
        self.piece_count
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn set_weight(&mut self, value: f64) {
        self.weight = round2(value);
    }

    pub fn set_tare(&mut self, value: f64) {
        self.tare = round2(value);
    }

    pub fn set_stable(&mut self, stable: bool) {
        self.stable = stable;
    }

    /// Set the piece count, clamping negative input to zero.
    pub fn set_piece_count(&mut self, count: i64) {
        self.piece_count = u64::try_from(count).unwrap_or(0);
    }

    pub fn set_display_text(&mut self, text: impl Into<String>) {
        self.display_text = text.into();
    }

    /// Take the current gross weight as tare.
    pub fn tare_current(&mut self) {
        self.tare = self.weight;
    }

    /// Zero the balance: weight and tare both go to 0.
    pub fn zero(&mut self) {
        self.weight = 0.0;
        self.tare = 0.0;
    }
}

impl Default for InstrumentState {
    fn default() -> Self {
        Self::new(0.0, true)
    }
}
