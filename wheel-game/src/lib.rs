//! Wheel Game Engine
//!
//! Platform-agnostic core for a risk wheel progression game: players spin a
//! segmented wheel zone by zone, accumulate at-risk gold, and either bank it on
//! a safe zone or lose it to a bomb. Rendering, audio and input live outside
//! this crate and talk to it through [`WheelSession`] and its events.

pub mod config;
pub mod constants;
pub mod data;
pub mod event;
pub mod ledger;
pub mod numbers;
pub mod rng;
pub mod session;
pub mod spin;
pub mod store;
pub mod zones;

pub use config::{OutcomePolicy, WheelConfig, WheelConfigError};
pub use data::{
    ContentError, ContentIssue, PresetDef, RewardType, SliceDefinition, WheelCatalog, WheelPreset,
    WheelType,
};
pub use event::{EventBus, EventLog, EventSink, SessionEvent, SubscriberId};
pub use ledger::{LedgerEffect, RewardLedger};
pub use rng::{CountingRng, SpinRng, derive_stream_seed};
pub use session::{ActionRejected, SessionPhase, SessionState, SpinReport, WheelSession};
pub use spin::{SpinOutcome, SpinResolver, normalize_rotation, slice_index_at_angle};
pub use store::{JsonFileBankStore, MemoryBankStore, StoreError};
pub use zones::ZoneLadder;

/// Source of authored wheel content.
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the preset catalog and zone assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read or parsed.
    fn load_catalog(&self) -> Result<WheelCatalog, Self::Error>;
}

/// Persistence for the banked total, keyed by save slot.
pub trait BankStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the banked total; `None` when the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_bank(&self, slot: &str) -> Result<Option<u64>, Self::Error>;

    /// Write the banked total.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save_bank(&self, slot: &str, value: u64) -> Result<(), Self::Error>;
}

/// Loader for the catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContent;

impl ContentLoader for StaticContent {
    type Error = ContentError;

    fn load_catalog(&self) -> Result<WheelCatalog, Self::Error> {
        WheelCatalog::load_from_static()
    }
}

/// Builds sessions from a content source and a bank store.
pub struct WheelEngine<L, S>
where
    L: ContentLoader,
    S: BankStore,
{
    loader: L,
    store: S,
    config: WheelConfig,
}

impl<L, S> WheelEngine<L, S>
where
    L: ContentLoader,
    S: BankStore + Clone,
{
    pub const fn new(loader: L, store: S, config: WheelConfig) -> Self {
        Self {
            loader,
            store,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &WheelConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Build the zone ladder from the loader's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be loaded or assigns no zones.
    pub fn load_ladder(&self) -> anyhow::Result<ZoneLadder>
    where
        L::Error: Into<anyhow::Error>,
    {
        let catalog = self.loader.load_catalog().map_err(Into::into)?;
        Ok(ZoneLadder::from_catalog(&catalog, self.config.slice_count)?)
    }

    /// Start a new session at zone 1 with the stored bank.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the content cannot be loaded.
    pub fn create_session(&self, seed: u64) -> anyhow::Result<WheelSession<S>>
    where
        L::Error: Into<anyhow::Error>,
    {
        self.config.validate()?;
        let ladder = self.load_ladder()?;
        let session = WheelSession::new(self.config.clone(), ladder, self.store.clone(), seed)?;
        log::debug!(
            "session created: seed {seed}, {} zones, slot {}",
            session.ladder().max_zone(),
            self.config.save_slot
        );
        Ok(session)
    }

    /// Read the banked total without starting a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn banked(&self) -> anyhow::Result<u64>
    where
        S::Error: Into<anyhow::Error>,
    {
        let value = self
            .store
            .load_bank(&self.config.save_slot)
            .map_err(Into::into)?;
        Ok(value.unwrap_or(0))
    }
}
