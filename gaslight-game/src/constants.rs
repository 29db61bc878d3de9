//! Centralized balance and tuning constants for the Gaslight fugitive core.
//!
//! These values define the deterministic math for the movement engine.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Event keys ---------------------------------------------------------------
pub(crate) const LOG_NO_GAME: &str = "log.game.not-started";
pub(crate) const LOG_GAME_WON: &str = "log.game.won";
pub(crate) const LOG_CRIME_DISCOVERED: &str = "log.crime.discovered";
pub(crate) const LOG_MOVED: &str = "log.fugitive.moved";
pub(crate) const LOG_CANNOT_MOVE: &str = "log.fugitive.cannot-move";
pub(crate) const LOG_OUT_OF_TIME: &str = "log.fugitive.out-of-time";
pub(crate) const LOG_RAPID_TRAPPED: &str = "log.fugitive.rapid-transit-trapped";
pub(crate) const LOG_TACTIC_WATER: &str = "log.tactic.water";
pub(crate) const LOG_TACTIC_SHORTCUT: &str = "log.tactic.shortcut";
pub(crate) const LOG_TACTIC_RAPID: &str = "log.tactic.rapid-transit";
pub(crate) const LOG_CLUE_SEARCH: &str = "log.clue.search";
pub(crate) const LOG_CLUE_FOUND: &str = "log.clue.found";
pub(crate) const LOG_CLUE_EMPTY: &str = "log.clue.empty";
pub(crate) const LOG_ARRESTED: &str = "log.arrest.hit";
pub(crate) const LOG_ARREST_MISSED: &str = "log.arrest.miss";
pub(crate) const LOG_PURSUERS_PLACED: &str = "log.pursuers.placed";

// Weight scheme ------------------------------------------------------------
/// Sentinel added to (or written into) edges the fugitive must not use.
/// Any accumulated path weight at or above this value means "unreachable".
pub(crate) const BLOCKED_WEIGHT: f32 = 1000.0;
/// Runtime weight of water and shortcut edges while the matching tactic
/// still has uses left. High enough that the planner only reaches for them
/// when ordinary streets are bad.
pub(crate) const DEFAULT_TACTIC_WEIGHT: f32 = 10.0;
/// Water edges drop to their true one-move cost under desperation and
/// inside relaxed-water distance queries.
pub(crate) const RELAXED_WATER_WEIGHT: f32 = 1.0;
/// Tolerance for float distance comparisons. All legal weight sums are
/// dyadic, so this only guards against accumulated rounding.
pub(crate) const DIST_EPS: f32 = 1e-4;

// Tactic accounting --------------------------------------------------------
/// Uses of each scarce tactic per game.
pub(crate) const TACTIC_USES: usize = 2;

// Planner bounds -----------------------------------------------------------
/// Upper bound on replans after an illegal shortcut landing; exhausting it
/// is treated the same as being cornered.
pub(crate) const MAX_REPLANS: usize = 8;
