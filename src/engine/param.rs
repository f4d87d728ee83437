//! Automatable Parameters
//!
//! A scalar value with a timeline of scheduled events. Supports the subset of
//! automation the sound layer needs: step changes, linear ramps and
//! cancellation.

/// A scheduled automation event
#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    /// Jump to `value` at `time`
    Set { time: f64, value: f32 },
    /// Ramp linearly from the previous event to `value`, arriving at `time`
    LinearRamp { time: f64, value: f32 },
}

impl Automation {
    #[inline]
    fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. } | Automation::LinearRamp { time, .. } => time,
        }
    }

    #[inline]
    fn value(&self) -> f32 {
        match *self {
            Automation::Set { value, .. } | Automation::LinearRamp { value, .. } => value,
        }
    }
}

/// Parameter with scheduled automation
///
/// Events are kept sorted by time. Insertion of an event at a time equal to an
/// existing one places it after the existing event.
#[derive(Debug, Clone)]
pub struct AudioParam {
    /// Value before the first event
    base: f32,
    events: Vec<Automation>,
}

impl AudioParam {
    /// Create a parameter with a constant value
    pub fn new(value: f32) -> Self {
        AudioParam {
            base: value,
            events: Vec::new(),
        }
    }

    /// Schedule a step to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::Set { time, value });
    }

    /// Schedule a linear ramp ending at (`time`, `value`)
    ///
    /// The ramp starts at the preceding event. When there is none, it starts
    /// from the value at `now`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64, now: f64) {
        let has_predecessor = self.events.iter().any(|e| e.time() <= time);
        if !has_predecessor {
            let start = self.value_at(now);
            self.insert(Automation::Set {
                time: now.min(time),
                value: start,
            });
        }
        self.insert(Automation::LinearRamp { time, value });
    }

    /// Remove every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Cancel all automation from `now` and hold `value` from then on
    pub fn set_value(&mut self, value: f32, now: f64) {
        self.cancel_scheduled_values(now);
        if self.events.is_empty() {
            self.base = value;
        } else {
            self.set_value_at_time(value, now);
        }
    }

    /// Evaluate the parameter at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        // Index of the first event strictly after `time`
        let next = self.events.partition_point(|e| e.time() <= time);

        let (prev_time, prev_value) = match next.checked_sub(1) {
            Some(i) => (Some(self.events[i].time()), self.events[i].value()),
            None => (None, self.base),
        };

        match self.events.get(next) {
            Some(Automation::LinearRamp {
                time: end,
                value: target,
            }) => {
                // A ramp without a predecessor holds the base value until it ends
                let Some(start) = prev_time else {
                    return prev_value;
                };
                let span = end - start;
                if span <= 0.0 {
                    return *target;
                }
                let t = ((time - start) / span) as f32;
                prev_value + (target - prev_value) * t
            }
            _ => prev_value,
        }
    }

    /// Drop events that can no longer influence values at or after `now`
    ///
    /// The most recent past event is folded into the base value unless a ramp
    /// still depends on it.
    pub fn prune(&mut self, now: f64) {
        let past = self.events.partition_point(|e| e.time() <= now);
        if past == 0 {
            return;
        }
        let ramp_pending = matches!(
            self.events.get(past),
            Some(Automation::LinearRamp { .. })
        );
        let keep_from = if ramp_pending { past - 1 } else { past };
        if keep_from == 0 && ramp_pending {
            return;
        }
        let settled = self.events[past - 1].value();
        self.events.drain(..keep_from);
        if !ramp_pending {
            self.base = settled;
        }
    }

    /// Number of scheduled events (for diagnostics)
    pub fn scheduled_len(&self) -> usize {
        self.events.len()
    }

    fn insert(&mut self, event: Automation) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}

impl Default for AudioParam {
    fn default() -> Self {
        Self::new(1.0)
    }
}
