use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use camino::Utf8Path;

use crate::error::MachinedrumError;
use crate::tracing_setup::{get_default_env_filter, setup_logging, LoggingState};
use error_logger_macro::log_errors;
use machinedrum_object::catalog;
use machinedrum_object::labels::{self, ParamCategory};
use machinedrum_object::pattern_label;
use machinedrum_object::store::{
    DurableBackend, JsonFileBackend, PersistentKeyValueStore, KEY_MODEL, KEY_OS_VERSION,
};
use machinedrum_object::sync::{EventBus, SlotAddress, SlotAddressing, SlotSyncTracker, Topic};
use machinedrum_object::types::SlotDomain;
use machinedrum_object::{DeviceModel, DeviceState, Kit, OsVersion, Pattern};
use tracing::{debug, info, instrument, warn};

struct Logging {
    subscriber: Arc<dyn tracing::Subscriber + Send + Sync + 'static>,
    state: Arc<LoggingState>,
}

/// One editor talking to one device.
///
/// The firmware version is never cached. Every firmware aware lookup reads it from the
/// store again, so a change made through the store shows up right away.
pub struct Session<B: DurableBackend, A: SlotAddressing> {
    state: DeviceState,
    store: PersistentKeyValueStore<B>,
    tracker: SlotSyncTracker<A>,
    bus: Arc<EventBus>,
    logging: Option<Logging>,
}

impl<A: SlotAddressing> Session<JsonFileBackend, A> {
    /// A session keeping its preferences in the default preferences file.
    pub fn open_default(addressing: A) -> Self {
        Self::new(PersistentKeyValueStore::open_default(), addressing)
    }

    /// A session keeping its preferences in the JSON file at `path`.
    pub fn open_at(path: impl AsRef<Utf8Path>, addressing: A) -> Self {
        let backend = JsonFileBackend::new(path.as_ref().as_str());
        Self::new(PersistentKeyValueStore::new(backend), addressing)
    }
}

impl<B: DurableBackend, A: SlotAddressing> Session<B, A> {
    pub fn new(store: PersistentKeyValueStore<B>, addressing: A) -> Self {
        let model = match store.get(KEY_MODEL) {
            Some(name) => name.parse::<DeviceModel>().unwrap_or_else(|err| {
                warn!("Stored device model is unusable, using the default. {}", err);
                DeviceModel::default()
            }),
            None => DeviceModel::default(),
        };

        let bus = Arc::new(EventBus::new());
        let mut tracker = SlotSyncTracker::new(addressing);
        tracker.attach(&bus);

        debug!("Session created for {}.", model);
        Self {
            state: DeviceState::new(model),
            store,
            tracker,
            bus,
            logging: None,
        }
    }

    /// Sets up a subscriber for this session. See [`Self::in_scope`].
    #[must_use]
    pub fn with_logging(mut self) -> Self {
        let (subscriber, state) = setup_logging();
        self.logging = Some(Logging { subscriber, state });
        self
    }

    /// Runs `f` with the session's subscriber as the default, or as is without one.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.logging {
            Some(logging) => tracing::subscriber::with_default(Arc::clone(&logging.subscriber), f),
            None => f(),
        }
    }

    pub const fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    pub const fn store(&self) -> &PersistentKeyValueStore<B> {
        &self.store
    }

    pub const fn tracker(&self) -> &SlotSyncTracker<A> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut SlotSyncTracker<A> {
        &mut self.tracker
    }

    /// The bus the transfer layer publishes slot events on.
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    pub fn os_version(&self) -> OsVersion {
        self.store
            .get(KEY_OS_VERSION)
            .map_or_else(OsVersion::default, OsVersion::new)
    }

    /// Returns false when the version only lasts for this session.
    #[instrument(skip(self))]
    pub fn set_os_version(&self, version: &str) -> bool {
        let version = OsVersion::new(version);
        info!("Firmware version set to {}.", version);
        self.store.set(KEY_OS_VERSION, version.as_str())
    }

    pub const fn device_model(&self) -> DeviceModel {
        self.state.model()
    }

    /// Switches the model and remembers it. Returns false when it only lasts for this session.
    #[instrument(skip(self))]
    pub fn set_device_model(&mut self, model: DeviceModel) -> bool {
        self.state.set_model(model);
        self.store.set(KEY_MODEL, model.as_str())
    }

    pub fn machine_name(&self, machine_id: u8) -> Cow<'static, str> {
        catalog::name_for(machine_id, &self.os_version())
    }

    /// Machines the current model can run, named for the current firmware.
    pub fn valid_machines(&self) -> BTreeMap<u8, Cow<'static, str>> {
        catalog::named_entries_for(self.device_model(), &self.os_version())
    }

    pub fn param_label(&self, machine_id: u8, index: usize, category: &str) -> Cow<'static, str> {
        labels::label_for_key(machine_id, index, category, &self.os_version())
    }

    /// Label of a parameter of `track` in the currently loaded kit.
    pub fn track_param_label(
        &self,
        track: usize,
        index: usize,
        category: ParamCategory,
    ) -> Option<Cow<'static, str>> {
        let machine_id = self.state.current_kit.machine(track)?;
        Some(labels::label_for(machine_id, index, category, &self.os_version()))
    }

    pub fn pattern_label(index: usize) -> String {
        pattern_label::index_to_label(index)
    }

    pub fn pattern_index(label: &str) -> usize {
        pattern_label::label_to_index(label)
    }

    /// Flags a slot as edited through the bus, the way any other producer would.
    pub fn mark_dirty(&self, address: SlotAddress) -> usize {
        self.bus.emit(Topic::SlotDirty, &address.ui_slot_id())
    }

    /// Puts `kit` into its library slot and flags the slot as edited.
    #[instrument(skip(self, kit))]
    #[log_errors(warn)]
    pub fn store_kit(&mut self, index: usize, kit: Kit) -> Result<(), MachinedrumError> {
        self.state.set_kit(index, kit)?;
        self.mark_dirty(SlotAddress::new(SlotDomain::Kit, index));
        Ok(())
    }

    /// Puts `pattern` into its library slot and flags the slot as edited.
    #[instrument(skip(self, pattern))]
    #[log_errors(warn)]
    pub fn store_pattern(&mut self, index: usize, pattern: Pattern) -> Result<(), MachinedrumError> {
        self.state.set_pattern(index, pattern)?;
        self.mark_dirty(SlotAddress::new(SlotDomain::Pattern, index));
        Ok(())
    }

    /// Drops every loaded object and every slot status.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.state.reset();
        // Anything still queued describes the state that was just dropped.
        let stale = self.tracker.pump();
        self.tracker.clear_all();
        info!("Session reset, {} stale events dropped.", stale);
    }

    pub fn pump_events(&mut self) -> usize {
        self.tracker.pump()
    }

    pub fn notify_structure_changed(&self) -> bool {
        self.tracker.notify_structure_changed()
    }

    /// Frame tick of the host, runs the coalesced indicator refresh.
    pub fn on_frame(&mut self) -> bool {
        self.tracker.on_frame()
    }

    pub fn log_level(&self) -> Option<tracing::Level> {
        self.logging
            .as_ref()
            .map(|logging| *logging.state.active_level.lock())
    }

    #[instrument(skip(self))]
    #[log_errors]
    pub fn change_log_level(&self, level: &str) -> Result<(), MachinedrumError> {
        let Some(logging) = &self.logging else {
            return Err(MachinedrumError::from(
                "Logging is not set up: Create the session with logging to change the log level.",
            ));
        };

        let new_level = match level {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => {
                return Err(MachinedrumError::from(format!(
                    "Invalid log level: {level}. It needs to be either error, warn, info, debug or trace."
                )));
            }
        };

        let mut active_log_level = logging.state.active_level.lock();

        if *active_log_level != new_level {
            let new_filter = get_default_env_filter().add_directive(new_level.into());

            logging
                .state
                .reload_handle
                .reload(new_filter)
                .inspect_err(|err| {
                    warn!(
                        "Failed to change log level from {} to {}: {:?}",
                        active_log_level, new_level, err
                    );
                })
                .ok();

            info!(
                "Default log level {} is successfully changed to: {}",
                active_log_level, new_level
            );
            *active_log_level = new_level;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machinedrum_object::store::MemoryBackend;
    use machinedrum_object::sync::HeadlessIndicators;

    fn session() -> Session<MemoryBackend, HeadlessIndicators> {
        let mut indicators = HeadlessIndicators::new();
        indicators.render_domain(SlotDomain::Kit, 64);
        indicators.render_domain(SlotDomain::Pattern, 128);
        Session::new(PersistentKeyValueStore::new(MemoryBackend::new()), indicators)
    }

    #[test]
    fn test_defaults_without_stored_preferences() {
        let session = session();
        assert_eq!(session.device_model(), DeviceModel::UwMk2);
        assert_eq!(session.os_version().as_str(), "1.70");
        assert_eq!(session.machine_name(1), "GND-SN");
        assert!(session.tracker().is_attached());
    }

    #[test]
    fn test_firmware_is_read_from_the_store_every_time() {
        let session = session();
        assert!(session.set_os_version("1.63"));
        assert_eq!(session.machine_name(1), "GND-SW");
        session.store().set(KEY_OS_VERSION, "1.70");
        assert_eq!(session.machine_name(1), "GND-SN");
    }

    #[test]
    fn test_firmware_survives_a_disabled_store() {
        let session = Session::new(
            PersistentKeyValueStore::new(MemoryBackend::failing()),
            HeadlessIndicators::new(),
        );
        assert!(!session.set_os_version("1.63"));
        assert!(session.os_version().is_163());
    }

    #[test]
    fn test_firmware_change_holds_when_the_store_turns_read_only() {
        let session = session();
        assert!(session.set_os_version("1.70"));
        session.store().backend().set_read_only(true);
        assert!(!session.set_os_version("1.63"));
        assert!(session.os_version().is_163());
        assert_eq!(session.machine_name(1), "GND-SW");
    }

    #[test]
    fn test_model_is_restored_from_the_store() {
        let store = PersistentKeyValueStore::new(MemoryBackend::new());
        store.set(KEY_MODEL, "mk1");
        let mut session = Session::new(store, HeadlessIndicators::new());
        assert_eq!(session.device_model(), DeviceModel::Mk1);
        assert!(session.valid_machines().keys().all(|id| *id <= 123));

        assert!(session.set_device_model(DeviceModel::UwMk1));
        assert_eq!(session.store().get(KEY_MODEL).as_deref(), Some("uw_mk1"));
        assert!(session.valid_machines().contains_key(&128));
    }

    #[test]
    fn test_preferences_file_carries_over_to_the_next_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("prefs.json");

        let mut session = Session::open_at(&path, HeadlessIndicators::new());
        assert!(session.store().is_durable());
        assert!(session.set_os_version("1.63"));
        assert!(session.set_device_model(DeviceModel::Mk2));
        drop(session);

        let session = Session::open_at(&path, HeadlessIndicators::new());
        assert_eq!(session.device_model(), DeviceModel::Mk2);
        assert_eq!(session.machine_name(1), "GND-SW");
    }

    #[test]
    fn test_unusable_stored_model_falls_back() {
        let store = PersistentKeyValueStore::new(MemoryBackend::new());
        store.set(KEY_MODEL, "tr909");
        let session = Session::new(store, HeadlessIndicators::new());
        assert_eq!(session.device_model(), DeviceModel::UwMk2);
    }

    #[test]
    fn test_labels_follow_the_loaded_kit() {
        let mut session = session();
        session.state_mut().current_kit.set_machine(2, 16, false).unwrap();
        assert_eq!(
            session.track_param_label(2, 0, ParamCategory::MachineParams).as_deref(),
            Some("PTCH")
        );
        assert_eq!(session.track_param_label(16, 0, ParamCategory::Routing), None);
        assert_eq!(session.param_label(16, 0, "lfo"), "n/a");
        assert_eq!(Session::<MemoryBackend, HeadlessIndicators>::pattern_label(17), "B02");
        assert_eq!(Session::<MemoryBackend, HeadlessIndicators>::pattern_index("B02"), 17);
    }

    #[test]
    fn test_stored_objects_show_up_dirty_after_pumping() {
        let mut session = session();
        session.store_kit(3, Kit::new()).unwrap();
        session.store_pattern(20, Pattern::new(20)).unwrap();
        assert!(session.store_kit(64, Kit::new()).is_err());
        assert!(session.tracker().tracked_ids().is_empty());

        assert_eq!(session.pump_events(), 2);
        assert!(session.tracker().status("kit:3").dirty);
        let address = SlotAddress::new(SlotDomain::Pattern, 20);
        assert!(session.tracker().addressing().shown(&address).unwrap().dirty);
    }

    #[test]
    fn test_reset_clears_state_and_status() {
        let mut session = session();
        session.store_kit(1, Kit::new()).unwrap();
        session.pump_events();
        session.bus().emit(Topic::SendStart, "kit:1");
        session.reset();
        assert!(session.state().kit(1).is_none());
        assert!(session.tracker().tracked_ids().is_empty());
        assert_eq!(session.pump_events(), 0);
    }

    #[test]
    fn test_change_log_level() {
        let session = session();
        assert!(session.change_log_level("debug").is_err());

        let session = session.with_logging();
        assert_eq!(session.log_level(), Some(tracing::Level::INFO));
        session.change_log_level("debug").unwrap();
        assert_eq!(session.log_level(), Some(tracing::Level::DEBUG));
        session.change_log_level("debug").unwrap();
        assert!(session.change_log_level("loud").is_err());
        assert_eq!(session.log_level(), Some(tracing::Level::DEBUG));
        assert_eq!(session.in_scope(|| 7), 7);
    }
}
