//! Phased workload generation
//!
//! A workload is emitted in three one-way phases:
//! - `Loading`: WRITEs of keys `0..n_records`, in order
//! - `Operations`: `n_operations` draws from the configured operation mix
//! - `Done`: nothing further
//!
//! Reads, updates and scans only ever target keys strictly below the
//! acknowledged high-water mark. `next_operation` never acknowledges on its
//! own: a caller that treats a WRITE as committed calls `acknowledge(key)`.

use super::selector::{OperationProportions, OperationSelector};
use super::value::ValueGenerator;
use crate::config::{Configuration, KeyDistribution, ScanLengthDistribution};
use crate::error::{Error, Result};
use tracegen_common::{AcknowledgedCounter, Operation, OperationType, Variate};

/// Rejection retries after which a run logs a warning (once).
const RETRY_WARN_THRESHOLD: u64 = 1000;

/// Generation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Operations,
    Done,
}

/// Everything built by `initialize()`
struct GenerationState {
    phase: Phase,
    loading_index: u64,
    operations_index: u64,
    /// Operations-phase emissions, scans counted by their length
    requests_emitted: u64,
    counter: AcknowledgedCounter,
    selector: OperationSelector,
    keys: Variate,
    scan_lengths: Option<Variate>,
    values: Option<ValueGenerator>,
    retry_warned: bool,
}

impl GenerationState {
    fn build(config: &Configuration) -> Result<Self> {
        let counter = AcknowledgedCounter::new(config.n_records);
        let proportions = OperationProportions::from_config(config);
        let selector = OperationSelector::new(proportions, config.operation_seed)?;
        let theta = config.zipfian_theta;

        let keys = match config.data_distribution {
            KeyDistribution::Uniform => Variate::uniform(0, config.n_records, config.key_seed)?,
            KeyDistribution::Zipfian => {
                let max = config.zipfian_key_max().ok_or_else(|| {
                    Error::Config("Zipfian key range overflows u64".to_string())
                })?;
                Variate::scrambled_zipfian(0, max, theta, config.key_seed)?
            }
            KeyDistribution::Latest => Variate::skewed_latest(&counter, theta, config.key_seed)?,
        };

        let scan_lengths = if config.scan_proportion > 0.0 {
            let (min, max) = (config.min_scan_length, config.max_scan_length);
            Some(match config.scan_length_distribution {
                ScanLengthDistribution::Uniform => Variate::uniform(min, max, config.scan_seed)?,
                // Bounded by the configured scan lengths, not by n_records.
                ScanLengthDistribution::Zipfian => {
                    Variate::scrambled_zipfian(min, max, theta, config.scan_seed)?
                }
            })
        } else {
            None
        };

        let values = if config.gen_values {
            Some(ValueGenerator::with_seed(
                config.value_min_size,
                config.value_max_size,
                config.value_seed,
            )?)
        } else {
            None
        };

        tracing::debug!(
            keys = keys.name(),
            scan_lengths = scan_lengths.as_ref().map(Variate::name),
            operations = ?selector.proportions().entries(),
            "workload generator initialized"
        );

        Ok(Self {
            phase: Phase::Loading,
            loading_index: 0,
            operations_index: 0,
            requests_emitted: 0,
            counter,
            selector,
            keys,
            scan_lengths,
            values,
            retry_warned: false,
        })
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }

    fn next_value(&mut self) -> Option<String> {
        let counter = &self.counter;
        self.values.as_mut().map(|values| values.next_value(counter))
    }

    /// Draw keys until `key + span < last_visible()`.
    fn draw_visible_key(
        &mut self,
        operation: &'static str,
        span: u64,
        max_retries: u64,
    ) -> Result<u64> {
        let visible_limit = self.counter.last_visible();
        for attempt in 1..=max_retries {
            let key = self.keys.next_value(&self.counter);
            if key.saturating_add(span) < visible_limit {
                if attempt > RETRY_WARN_THRESHOLD && !self.retry_warned {
                    self.retry_warned = true;
                    tracing::warn!(
                        operation,
                        attempt,
                        visible_limit,
                        "key draw needed many rejection retries"
                    );
                }
                return Ok(key);
            }
        }
        Err(Error::InfeasibleDistribution { operation, attempts: max_retries, visible_limit })
    }

    fn next_loading(&mut self) -> Operation {
        let key = self.loading_index;
        self.loading_index += 1;
        let value = self.next_value();
        Operation::write(key, value)
    }

    fn next_operation(&mut self, max_retries: u64) -> Result<Operation> {
        let kind = self.selector.select()?;
        let operation = match kind {
            OperationType::Read => {
                let key = self.draw_visible_key("read", 0, max_retries)?;
                self.requests_emitted += 1;
                Operation::read(key)
            }
            OperationType::Update => {
                // Updates go out as WRITEs against an existing key.
                let key = self.draw_visible_key("update", 0, max_retries)?;
                self.requests_emitted += 1;
                Operation::write(key, self.next_value())
            }
            OperationType::Write => {
                let key = self.counter.allocate();
                self.requests_emitted += 1;
                Operation::write(key, self.next_value())
            }
            OperationType::Scan => {
                let frontier = &self.counter;
                let length = match self.scan_lengths.as_mut() {
                    Some(lengths) => lengths.next_value(frontier),
                    None => {
                        return Err(Error::Other("scan selected without a scan length sampler".into()))
                    }
                };
                let start = self.draw_visible_key("scan", length, max_retries)?;
                self.requests_emitted += length;
                Operation::scan(start, length)
            }
            OperationType::Delete => {
                return Err(Error::Other("delete operations are not generated".into()));
            }
        };
        self.operations_index += 1;
        Ok(operation)
    }
}

/// Deterministic YCSB-style operation stream
///
/// Build it with [`WorkloadGenerator::new`] (validates and initializes) or
/// [`WorkloadGenerator::deferred`] (configuration only, call `initialize()`
/// later). One instance must be driven by a single owner; independent streams
/// need independent instances.
pub struct WorkloadGenerator {
    config: Configuration,
    state: Option<GenerationState>,
}

impl WorkloadGenerator {
    /// Validate `config` and initialize immediately.
    pub fn new(config: Configuration) -> Result<Self> {
        let mut generator = Self::deferred(config);
        generator.initialize()?;
        Ok(generator)
    }

    /// Hold `config` without building any generation state.
    pub fn deferred(config: Configuration) -> Self {
        Self { config, state: None }
    }

    /// Validate the configuration and build samplers. No-op once initialized.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }
        self.config.validate()?;
        self.state = Some(GenerationState::build(&self.config)?);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Replace the configuration and drop all generation state.
    pub fn reload(&mut self, config: Configuration) {
        self.config = config;
        self.state = None;
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Mutable configuration; only available before initialization.
    pub fn config_mut(&mut self) -> Result<&mut Configuration> {
        if self.state.is_some() {
            return Err(Error::Other("configuration is frozen once initialized".into()));
        }
        Ok(&mut self.config)
    }

    fn state(&self) -> Result<&GenerationState> {
        self.state.as_ref().ok_or(Error::NotInitialized)
    }

    fn state_mut(&mut self) -> Result<&mut GenerationState> {
        self.state.as_mut().ok_or(Error::NotInitialized)
    }

    /// Produce the next operation, or `None` once the workload has ended.
    pub fn next_operation(&mut self) -> Result<Option<Operation>> {
        let n_records = self.config.n_records;
        let n_operations = self.config.n_operations;
        let max_retries = self.config.max_retries;
        let state = self.state_mut()?;

        if state.phase == Phase::Loading {
            if state.loading_index < n_records {
                return Ok(Some(state.next_loading()));
            }
            state.advance(Phase::Operations);
        }

        if state.phase == Phase::Operations {
            if state.operations_index < n_operations {
                return state.next_operation(max_retries).map(Some);
            }
            state.advance(Phase::Done);
        }

        Ok(None)
    }

    /// Mark `key` as committed, raising the visible high-water mark.
    pub fn acknowledge(&mut self, key: u64) -> Result<()> {
        self.state_mut()?.counter.acknowledge(key);
        Ok(())
    }

    pub fn last_visible(&self) -> Result<u64> {
        Ok(self.state()?.counter.last_visible())
    }

    pub fn current_phase(&self) -> Result<Phase> {
        Ok(self.state()?.phase)
    }

    /// Jump to the next phase without emitting what is left of this one.
    pub fn skip_current_phase(&mut self) -> Result<Phase> {
        let state = self.state_mut()?;
        match state.phase {
            Phase::Loading => state.advance(Phase::Operations),
            Phase::Operations => state.advance(Phase::Done),
            Phase::Done => {}
        }
        Ok(state.phase)
    }

    /// Operations-phase requests so far, with each scan counted by its length.
    pub fn requests_emitted(&self) -> Result<u64> {
        Ok(self.state()?.requests_emitted)
    }

    pub fn loading_index(&self) -> Result<u64> {
        Ok(self.state()?.loading_index)
    }

    pub fn operations_index(&self) -> Result<u64> {
        Ok(self.state()?.operations_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n_records: u64, n_operations: u64) -> Configuration {
        Configuration { n_records, n_operations, read_proportion: 1.0, ..Default::default() }
    }

    fn drain(generator: &mut WorkloadGenerator, acknowledge: bool) -> Vec<Operation> {
        let mut out = Vec::new();
        while let Some(op) = generator.next_operation().unwrap() {
            if acknowledge && op.is_write() {
                generator.acknowledge(op.key).unwrap();
            }
            out.push(op);
        }
        out
    }

    #[test]
    fn test_loading_then_reads() {
        let mut generator = WorkloadGenerator::new(config(10, 5)).unwrap();
        let ops = drain(&mut generator, true);

        assert_eq!(ops.len(), 15);
        for (i, op) in ops[..10].iter().enumerate() {
            assert_eq!(*op, Operation::write(i as u64, None));
        }
        for op in &ops[10..] {
            assert_eq!(op.kind, OperationType::Read);
            assert!(op.key < 10);
        }
        assert_eq!(generator.current_phase().unwrap(), Phase::Done);
        assert!(generator.next_operation().unwrap().is_none());
    }

    #[test]
    fn test_deferred_requires_initialize() {
        let mut generator = WorkloadGenerator::deferred(config(10, 5));
        assert!(!generator.is_initialized());
        assert!(matches!(generator.next_operation(), Err(Error::NotInitialized)));

        generator.config_mut().unwrap().n_operations = 2;
        generator.initialize().unwrap();
        assert!(generator.config_mut().is_err());
        assert_eq!(drain(&mut generator, true).len(), 12);
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut generator = WorkloadGenerator::deferred(config(0, 5));
        assert!(matches!(generator.initialize(), Err(Error::Config(_))));
        assert!(!generator.is_initialized());
    }

    #[test]
    fn test_overflowing_zipfian_key_range_is_config_error() {
        let overflowing = Configuration {
            insert_proportion: 1e18,
            data_distribution: KeyDistribution::Zipfian,
            ..config(10, 10)
        };
        assert!(matches!(WorkloadGenerator::new(overflowing), Err(Error::Config(_))));
    }

    #[test]
    fn test_reload_resets_state() {
        let mut generator = WorkloadGenerator::new(config(3, 1)).unwrap();
        drain(&mut generator, true);
        generator.reload(config(4, 0));
        assert!(!generator.is_initialized());
        generator.initialize().unwrap();
        assert_eq!(drain(&mut generator, true).len(), 4);
    }

    #[test]
    fn test_skip_phases() {
        let mut generator = WorkloadGenerator::new(config(10, 5)).unwrap();
        generator.next_operation().unwrap();
        assert_eq!(generator.skip_current_phase().unwrap(), Phase::Operations);

        let op = generator.next_operation().unwrap().unwrap();
        assert_eq!(op.kind, OperationType::Read);

        assert_eq!(generator.skip_current_phase().unwrap(), Phase::Done);
        assert!(generator.next_operation().unwrap().is_none());
        assert_eq!(generator.skip_current_phase().unwrap(), Phase::Done);
    }

    #[test]
    fn test_update_is_relabeled_write_on_existing_key() {
        let config = Configuration { read_proportion: 0.0, update_proportion: 1.0, ..config(20, 50) };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        let ops = drain(&mut generator, true);
        for op in &ops[20..] {
            assert_eq!(op.kind, OperationType::Write);
            assert!(op.key < 20);
        }
    }

    #[test]
    fn test_inserts_allocate_fresh_keys() {
        let config = Configuration { read_proportion: 0.0, insert_proportion: 1.0, ..config(5, 4) };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        let keys: Vec<u64> = drain(&mut generator, false)[5..].iter().map(|op| op.key).collect();
        assert_eq!(keys, vec![5, 6, 7, 8]);
        // next_operation never acknowledges by itself.
        assert_eq!(generator.last_visible().unwrap(), 4);
    }

    #[test]
    fn test_acknowledge_widens_visible_range() {
        let config = Configuration {
            read_proportion: 0.5,
            insert_proportion: 0.5,
            data_distribution: KeyDistribution::Latest,
            ..config(10, 200)
        };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        let mut limit = generator.last_visible().unwrap();
        while let Some(op) = generator.next_operation().unwrap() {
            if op.kind == OperationType::Read {
                assert!(op.key < limit, "read {} not below limit {}", op.key, limit);
            }
            if op.is_write() {
                generator.acknowledge(op.key).unwrap();
            }
            let next_limit = generator.last_visible().unwrap();
            assert!(next_limit >= limit);
            limit = next_limit;
        }
        assert!(limit > 9);
    }

    #[test]
    fn test_scan_containment_and_request_count() {
        let config = Configuration {
            read_proportion: 0.0,
            scan_proportion: 1.0,
            min_scan_length: 1,
            max_scan_length: 5,
            ..config(100, 50)
        };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        let ops = drain(&mut generator, true);

        let mut total_length = 0;
        for op in &ops[100..] {
            assert_eq!(op.kind, OperationType::Scan);
            assert!((1..=5).contains(&op.scan_length));
            assert!(op.key + op.scan_length < 99);
            total_length += op.scan_length;
        }
        assert_eq!(ops.len(), 150);
        assert_eq!(generator.requests_emitted().unwrap(), total_length);
    }

    #[test]
    fn test_infeasible_scan_fails_instead_of_hanging() {
        let config = Configuration {
            read_proportion: 0.0,
            scan_proportion: 1.0,
            min_scan_length: 50,
            max_scan_length: 60,
            max_retries: 100,
            ..config(10, 1)
        };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        for _ in 0..10 {
            generator.next_operation().unwrap();
        }
        let err = generator.next_operation().unwrap_err();
        assert!(matches!(err, Error::InfeasibleDistribution { operation: "scan", attempts: 100, .. }));
    }

    #[test]
    fn test_single_record_reads_are_infeasible() {
        let config = Configuration { max_retries: 10, ..config(1, 1) };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        let first = generator.next_operation().unwrap().unwrap();
        generator.acknowledge(first.key).unwrap();
        assert!(matches!(
            generator.next_operation(),
            Err(Error::InfeasibleDistribution { operation: "read", .. })
        ));
    }

    #[test]
    fn test_values_only_on_writes() {
        let config = Configuration {
            read_proportion: 0.5,
            insert_proportion: 0.5,
            gen_values: true,
            value_min_size: 4,
            value_max_size: 8,
            ..config(10, 40)
        };
        let mut generator = WorkloadGenerator::new(config).unwrap();
        for op in drain(&mut generator, true) {
            match op.kind {
                OperationType::Write => {
                    let len = op.value.as_ref().map(String::len).unwrap_or(0);
                    assert!((4..=8).contains(&len));
                }
                _ => assert!(op.value.is_none()),
            }
        }
    }

    #[test]
    fn test_deterministic_across_instances() {
        let config = Configuration {
            read_proportion: 0.4,
            update_proportion: 0.2,
            insert_proportion: 0.2,
            scan_proportion: 0.2,
            data_distribution: KeyDistribution::Zipfian,
            scan_length_distribution: ScanLengthDistribution::Zipfian,
            min_scan_length: 1,
            max_scan_length: 10,
            gen_values: true,
            value_min_size: 1,
            value_max_size: 16,
            key_seed: 3,
            operation_seed: 4,
            scan_seed: 5,
            value_seed: 6,
            ..config(1000, 500)
        };
        let mut a = WorkloadGenerator::new(config.clone()).unwrap();
        let mut b = WorkloadGenerator::new(config).unwrap();
        assert_eq!(drain(&mut a, true), drain(&mut b, true));
    }
}
