//! `Logic`: the DSL's boolean state machine.
//!
//! Grounded on `MayaFlux::Vruta::LogicNode` in
//! `examples/original_source/src/MayaFlux/Kriya/Logic.hpp` — mode/operator
//! dispatch, two-threshold hysteresis with latched state, bounded sequential
//! history, and save/restore of durable state so an external processor can
//! probe the machine over a window without perturbing it.

use std::collections::VecDeque;

use bitflags::bitflags;

use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single float input, evaluated immediately.
    Direct,
    /// Maintains a bounded FIFO of past boolean states, evaluated by a
    /// user predicate over the window.
    Sequential,
    /// Evaluated with `(input, absolute_time)`.
    Temporal,
    /// Evaluated over a slice of inputs (AND/OR/XOR-style combination, or a
    /// custom reducer).
    MultiInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Xor,
    Not,
    Nand,
    Nor,
    Implies,
    Threshold,
    Hysteresis,
    Edge,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Rising,
    Falling,
    Both,
}

bitflags! {
    /// Which events during an evaluation step should fire a node's
    /// registered callbacks. A callback can subscribe to more than one.
    pub struct CallbackTrigger: u32 {
        /// Every evaluation, regardless of outcome.
        const TICK = 0x1;
        /// Current boolean output is true.
        const WHILE_TRUE = 0x2;
        /// Current boolean output is false.
        const WHILE_FALSE = 0x4;
        /// Boolean output differs from the previous evaluation.
        const CHANGE = 0x8;
        /// Boolean output just transitioned to true.
        const TRUE = 0x10;
        /// Boolean output just transitioned to false.
        const FALSE = 0x20;
        /// The user-supplied conditional predicate returned true.
        const CONDITIONAL = 0x40;
    }
}

pub type SequentialPredicate = Box<dyn Fn(&VecDeque<bool>) -> bool + Send>;
pub type MultiInputReducer = Box<dyn Fn(&[f64]) -> f64 + Send>;
pub type ConditionalPredicate = Box<dyn Fn(f64) -> bool + Send>;
pub type LogicCallback = Box<dyn FnMut(f64) + Send>;

/// Durable state captured by [`Logic::save_state`] and restored by
/// [`Logic::restore_state`], letting a caller evaluate the machine
/// speculatively without committing the result.
#[derive(Clone)]
struct Snapshot {
    last_output: f64,
    last_bool: bool,
    history: VecDeque<bool>,
    hysteresis_state: bool,
    edge_detected: bool,
    temporal_time: f64,
}

pub struct Logic {
    mode: Mode,
    operator: Operator,
    edge: EdgeKind,
    threshold: f64,
    hysteresis_low: f64,
    hysteresis_high: f64,
    hysteresis_state: bool,

    history: VecDeque<bool>,
    history_capacity: usize,
    sequential_predicate: Option<SequentialPredicate>,
    multi_input_reducer: Option<MultiInputReducer>,
    conditional_predicate: Option<ConditionalPredicate>,

    last_output: f64,
    last_bool: bool,
    edge_detected: bool,
    temporal_time: f64,

    callbacks: Vec<(CallbackTrigger, LogicCallback)>,
    mock: bool,
    saved: Option<Snapshot>,
}

impl Logic {
    pub fn new(mode: Mode, operator: Operator) -> Self {
        Self {
            mode,
            operator,
            edge: EdgeKind::Rising,
            threshold: 0.5,
            hysteresis_low: 0.3,
            hysteresis_high: 0.7,
            hysteresis_state: false,
            history: VecDeque::new(),
            history_capacity: 16,
            sequential_predicate: None,
            multi_input_reducer: None,
            conditional_predicate: None,
            last_output: 0.0,
            last_bool: false,
            edge_detected: false,
            temporal_time: 0.0,
            callbacks: Vec::new(),
            mock: false,
            saved: None,
        }
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn set_hysteresis(&mut self, low: f64, high: f64) {
        self.hysteresis_low = low;
        self.hysteresis_high = high;
    }

    pub fn set_edge_kind(&mut self, edge: EdgeKind) {
        self.edge = edge;
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history_capacity = capacity.max(1);
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }
    }

    pub fn set_sequential_predicate(&mut self, predicate: SequentialPredicate) {
        self.sequential_predicate = Some(predicate);
    }

    pub fn set_multi_input_reducer(&mut self, reducer: MultiInputReducer) {
        self.multi_input_reducer = Some(reducer);
    }

    pub fn set_conditional_predicate(&mut self, predicate: ConditionalPredicate) {
        self.conditional_predicate = Some(predicate);
    }

    pub fn on(&mut self, trigger: CallbackTrigger, callback: LogicCallback) {
        self.callbacks.push((trigger, callback));
    }

    pub fn get_last_output(&self) -> f64 {
        self.last_output
    }

    pub fn edge_detected(&self) -> bool {
        self.edge_detected
    }

    pub fn history(&self) -> &VecDeque<bool> {
        &self.history
    }

    pub fn temporal_time(&self) -> f64 {
        self.temporal_time
    }

    fn to_bool(&self, input: f64) -> bool {
        input >= self.threshold
    }

    /// Evaluate the `Direct`-mode operator against `input` and the
    /// previously latched boolean (for the binary operators, which read a
    /// single float input one sample at a time rather than two operands).
    fn apply_direct(&mut self, input: f64) -> bool {
        let current = self.to_bool(input);
        let previous = self.last_bool;
        match self.operator {
            Operator::And => current && previous,
            Operator::Or => current || previous,
            Operator::Xor => current ^ previous,
            Operator::Not => !current,
            Operator::Nand => !(current && previous),
            Operator::Nor => !(current || previous),
            Operator::Implies => !previous || current,
            Operator::Threshold => current,
            Operator::Hysteresis => {
                if self.hysteresis_state {
                    if input < self.hysteresis_low {
                        self.hysteresis_state = false;
                    }
                } else if input > self.hysteresis_high {
                    self.hysteresis_state = true;
                }
                self.hysteresis_state
            }
            Operator::Edge => current,
            Operator::Custom => self
                .multi_input_reducer
                .as_ref()
                .map(|f| f(&[input]) >= self.threshold)
                .unwrap_or(current),
        }
    }

    /// `Direct`/`Temporal` mode entry point: combine a single float input
    /// into a new boolean output, firing callbacks and edge detection.
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let previous_bool = self.last_bool;
        let mut current = self.apply_direct(input);

        self.edge_detected = if self.operator == Operator::Edge {
            let rose = !previous_bool && current;
            let fell = previous_bool && !current;
            let fired = match self.edge {
                EdgeKind::Rising => rose,
                EdgeKind::Falling => fell,
                EdgeKind::Both => rose || fell,
            };
            current = fired;
            fired
        } else {
            false
        };

        self.commit(current, previous_bool)
    }

    /// `Temporal`-mode entry point: as [`Logic::process_sample`], but also
    /// records `absolute_time` for callers that inspect `temporal_time`.
    pub fn process_temporal(&mut self, input: f64, absolute_time: f64) -> f64 {
        self.temporal_time = absolute_time;
        self.process_sample(input)
    }

    /// `Sequential`-mode entry point: push `input`'s boolean reading into
    /// the bounded history and evaluate the registered predicate over it.
    /// Falls back to "any true in history" when no predicate is set.
    pub fn process_sequential(&mut self, input: f64) -> f64 {
        let previous_bool = self.last_bool;
        let bit = self.to_bool(input);
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(bit);

        let current = match &self.sequential_predicate {
            Some(predicate) => predicate(&self.history),
            None => self.history.iter().any(|b| *b),
        };
        self.commit(current, previous_bool)
    }

    /// `MultiInput`-mode entry point: combine `inputs` via the operator (or
    /// a custom reducer for [`Operator::Custom`]).
    pub fn process_multi(&mut self, inputs: &[f64]) -> f64 {
        let previous_bool = self.last_bool;
        let bits: Vec<bool> = inputs.iter().map(|v| self.to_bool(*v)).collect();
        let current = match self.operator {
            Operator::And => bits.iter().all(|b| *b),
            Operator::Or => bits.iter().any(|b| *b),
            Operator::Xor => bits.iter().filter(|b| **b).count() % 2 == 1,
            Operator::Nand => !bits.iter().all(|b| *b),
            Operator::Nor => !bits.iter().any(|b| *b),
            Operator::Not => bits.first().map(|b| !*b).unwrap_or(false),
            Operator::Implies => {
                bits.len() < 2 || !bits[0] || bits[1..].iter().all(|b| *b)
            }
            Operator::Custom => self
                .multi_input_reducer
                .as_ref()
                .map(|f| f(inputs) >= self.threshold)
                .unwrap_or(false),
            Operator::Threshold | Operator::Hysteresis | Operator::Edge => {
                bits.first().copied().unwrap_or(false)
            }
        };
        self.commit(current, previous_bool)
    }

    fn commit(&mut self, current: bool, previous_bool: bool) -> f64 {
        self.last_bool = current;
        self.last_output = if current { 1.0 } else { 0.0 };
        if !self.mock {
            self.fire_callbacks(current, previous_bool);
        }
        self.last_output
    }

    fn fire_callbacks(&mut self, current: bool, previous: bool) {
        let changed = current != previous;
        let conditional_fired = self
            .conditional_predicate
            .as_ref()
            .map(|p| p(self.last_output))
            .unwrap_or(false);

        for (trigger, callback) in self.callbacks.iter_mut() {
            let mut fire = trigger.contains(CallbackTrigger::TICK);
            fire |= trigger.contains(CallbackTrigger::WHILE_TRUE) && current;
            fire |= trigger.contains(CallbackTrigger::WHILE_FALSE) && !current;
            fire |= trigger.contains(CallbackTrigger::CHANGE) && changed;
            fire |= trigger.contains(CallbackTrigger::TRUE) && changed && current;
            fire |= trigger.contains(CallbackTrigger::FALSE) && changed && !current;
            fire |= trigger.contains(CallbackTrigger::CONDITIONAL) && conditional_fired;
            if fire {
                callback(self.last_output);
            }
        }
    }

    /// Snapshot durable state so a caller can probe the machine over a
    /// window of samples and then roll back as if it never happened.
    pub fn save_state(&mut self) {
        self.saved = Some(Snapshot {
            last_output: self.last_output,
            last_bool: self.last_bool,
            history: self.history.clone(),
            hysteresis_state: self.hysteresis_state,
            edge_detected: self.edge_detected,
            temporal_time: self.temporal_time,
        });
    }

    pub fn restore_state(&mut self) {
        if let Some(snapshot) = self.saved.take() {
            self.last_output = snapshot.last_output;
            self.last_bool = snapshot.last_bool;
            self.history = snapshot.history;
            self.hysteresis_state = snapshot.hysteresis_state;
            self.edge_detected = snapshot.edge_detected;
            self.temporal_time = snapshot.temporal_time;
        }
    }
}

impl Node for Logic {
    fn process_sample(&mut self, input: f64) -> f64 {
        match self.mode {
            Mode::Direct | Mode::Temporal => Logic::process_sample(self, input),
            Mode::Sequential => self.process_sequential(input),
            Mode::MultiInput => self.process_multi(&[input]),
        }
    }

    fn enable_mock_process(&mut self, enabled: bool) {
        self.mock = enabled;
    }

    fn is_mock_process_enabled(&self) -> bool {
        self.mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_operator_matches_scenario_s4_first_half() {
        let mut logic = Logic::new(Mode::Direct, Operator::Threshold);
        logic.set_threshold(0.5);
        assert_eq!(logic.process_sample(0.6), 1.0);
        assert_eq!(logic.process_sample(0.4), 0.0);
    }

    #[test]
    fn hysteresis_operator_matches_scenario_s4() {
        let mut logic = Logic::new(Mode::Direct, Operator::Hysteresis);
        logic.set_hysteresis(0.3, 0.7);
        let inputs = [0.4, 0.6, 0.8, 0.6, 0.4, 0.2];
        let expected = [0.0, 0.0, 1.0, 1.0, 1.0, 0.0];
        for (input, expect) in inputs.iter().zip(expected.iter()) {
            assert_eq!(logic.process_sample(*input), *expect);
        }
    }

    #[test]
    fn rising_edge_fires_once_on_transition_matching_scenario_s5() {
        let mut logic = Logic::new(Mode::Direct, Operator::Edge);
        logic.set_threshold(0.5);
        logic.set_edge_kind(EdgeKind::Rising);
        let inputs = [0.4, 0.6, 0.7, 0.4];
        let expected = [0.0, 1.0, 0.0, 0.0];
        for (input, expect) in inputs.iter().zip(expected.iter()) {
            assert_eq!(logic.process_sample(*input), *expect);
        }
    }

    #[test]
    fn threshold_epsilon_boundary_matches_invariant_table() {
        let mut above = Logic::new(Mode::Direct, Operator::Threshold);
        above.set_threshold(0.5);
        assert_eq!(above.process_sample(0.5 + 1e-6), 1.0);

        let mut below = Logic::new(Mode::Direct, Operator::Threshold);
        below.set_threshold(0.5);
        assert_eq!(below.process_sample(0.5 - 1e-6), 0.0);
    }

    #[test]
    fn save_restore_roundtrips_durable_state() {
        let mut logic = Logic::new(Mode::Direct, Operator::Hysteresis);
        logic.set_hysteresis(0.3, 0.7);
        logic.process_sample(0.8);
        logic.save_state();
        let before_output = logic.get_last_output();
        let before_state = logic.hysteresis_state;

        logic.process_sample(0.6);
        logic.process_sample(0.2);

        logic.restore_state();
        assert_eq!(logic.get_last_output(), before_output);
        assert_eq!(logic.hysteresis_state, before_state);
    }

    #[test]
    fn sequential_mode_evaluates_bounded_history_with_predicate() {
        let mut logic = Logic::new(Mode::Sequential, Operator::Custom);
        logic.set_threshold(0.5);
        logic.set_history_capacity(3);
        logic.set_sequential_predicate(Box::new(|history| history.iter().all(|b| *b)));

        assert_eq!(logic.process_sequential(0.9), 0.0);
        assert_eq!(logic.process_sequential(0.9), 0.0);
        assert_eq!(logic.process_sequential(0.9), 1.0);
        assert_eq!(logic.process_sequential(0.1), 0.0);
    }

    #[test]
    fn multi_input_and_requires_all_inputs_true() {
        let mut logic = Logic::new(Mode::MultiInput, Operator::And);
        logic.set_threshold(0.5);
        assert_eq!(logic.process_multi(&[0.9, 0.9, 0.9]), 1.0);
        assert_eq!(logic.process_multi(&[0.9, 0.1, 0.9]), 0.0);
    }

    #[test]
    fn mock_process_suppresses_callbacks() {
        let mut logic = Logic::new(Mode::Direct, Operator::Threshold);
        logic.set_threshold(0.5);
        let fired = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let flag = fired.clone();
        logic.on(
            CallbackTrigger::TICK,
            Box::new(move |_| {
                flag.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }),
        );
        logic.enable_mock_process(true);
        logic.process_sample(0.9);
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 0);

        logic.enable_mock_process(false);
        logic.process_sample(0.9);
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
