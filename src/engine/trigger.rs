use crate::{TimestampMs, config::Interval, event::TriggerEvent};

/// Ordered interleaving of precomputed signal triggers with dynamically
/// generated periodic triggers.
///
/// The periodic clock follows the live executor's reset rule: *any* emitted
/// trigger (signal or scheduled) re-arms the next scheduled check `Δ` after
/// itself. Periodic triggers therefore fire `Δ` after the previous trigger of
/// any kind, not on a fixed grid anchored at the start time. With no interval
/// configured, only signal triggers are emitted.
///
/// The stream is lazy: scheduled events are materialised one at a time as the
/// consumer pulls, so long windows cost nothing up front.
#[derive(Debug)]
pub struct TriggerStream {
    signals: std::vec::IntoIter<TriggerEvent>,
    /// Next signal trigger, held back while scheduled triggers fire before it.
    pending_signal: Option<TriggerEvent>,
    interval_ms: Option<u64>,
    last_time: TimestampMs,
    end_time: TimestampMs,
}

impl TriggerStream {
    /// Build a stream over the provided signal triggers (sorted internally)
    /// and optional scheduled interval.
    pub fn new(
        mut signal_triggers: Vec<TriggerEvent>,
        scheduled_interval: Option<Interval>,
        start_time: TimestampMs,
        end_time: TimestampMs,
    ) -> Self {
        signal_triggers.sort_by_key(|event| event.timestamp);
        Self {
            signals: signal_triggers.into_iter(),
            pending_signal: None,
            interval_ms: scheduled_interval.map(|interval| interval.as_millis()),
            last_time: start_time,
            end_time,
        }
    }

    /// Count the triggers the equivalent stream would emit, without building
    /// any events. Used for progress estimation.
    pub fn count<Timestamps>(
        signal_timestamps: Timestamps,
        scheduled_interval: Option<Interval>,
        start_time: TimestampMs,
        end_time: TimestampMs,
    ) -> usize
    where
        Timestamps: IntoIterator<Item = TimestampMs>,
    {
        let interval_ms = scheduled_interval.map(|interval| interval.as_millis());
        let mut total = 0;
        let mut last_time = start_time;

        for timestamp in signal_timestamps {
            if let Some(interval_ms) = interval_ms {
                while last_time + interval_ms < timestamp {
                    total += 1;
                    last_time += interval_ms;
                }
            }
            total += 1;
            last_time = timestamp;
        }

        if let Some(interval_ms) = interval_ms {
            while last_time + interval_ms <= end_time {
                total += 1;
                last_time += interval_ms;
            }
        }

        total
    }
}

impl Iterator for TriggerStream {
    type Item = TriggerEvent;

    fn next(&mut self) -> Option<TriggerEvent> {
        if self.pending_signal.is_none() {
            self.pending_signal = self.signals.next();
        }

        match (&self.pending_signal, self.interval_ms) {
            (Some(signal), Some(interval_ms)) => {
                let next_scheduled = self.last_time + interval_ms;
                if next_scheduled < signal.timestamp {
                    self.last_time = next_scheduled;
                    Some(TriggerEvent::scheduled(next_scheduled))
                } else {
                    let signal = self.pending_signal.take().expect("pending signal present");
                    self.last_time = signal.timestamp;
                    Some(signal)
                }
            }
            (Some(_), None) => {
                let signal = self.pending_signal.take().expect("pending signal present");
                self.last_time = signal.timestamp;
                Some(signal)
            }
            (None, Some(interval_ms)) => {
                let next_scheduled = self.last_time + interval_ms;
                if next_scheduled <= self.end_time {
                    self.last_time = next_scheduled;
                    Some(TriggerEvent::scheduled(next_scheduled))
                } else {
                    None
                }
            }
            (None, None) => None,
        }
    }
}
