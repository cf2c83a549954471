//! Simulated split and fill feeders.
//!
//! Each feeder runs on its own thread and refreshes a [`LatestSlot`] on its
//! own cadence. The cycle driver only ever reads the current value; nothing
//! is queued, so a fill replaced before the next cycle is never allocated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use fillsplit::{FillSnapshot, SplitSnapshot};
use log::{error, info};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::{SliceRandom, index};

use crate::config::{FillConfig, ScheduleConfig, SplitConfig};
use crate::error::{Error, Result};

const TOTAL_PERCENT: u32 = 100;

/// Most recent value published by a feeder.
#[derive(Debug)]
pub struct LatestSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        LatestSlot {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        LatestSlot {
            inner: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current value.
    pub fn publish(&self, value: T) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    /// Clone of the current value, if any has been published.
    pub fn latest(&self) -> Option<T> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Split 100 into `accounts` positive integers using sorted random dividers.
///
/// `accounts` must be in `1..=100`.
pub fn draw_percentages<R: Rng>(rng: &mut R, accounts: usize) -> Result<Vec<u32>> {
    if !(1..=TOTAL_PERCENT as usize).contains(&accounts) {
        return Err(Error::Feed(format!(
            "cannot split {TOTAL_PERCENT}% over {accounts} accounts"
        )));
    }

    let mut dividers: Vec<u32> = index::sample(rng, (TOTAL_PERCENT - 1) as usize, accounts - 1)
        .into_iter()
        .map(|i| i as u32 + 1)
        .collect();
    dividers.sort_unstable();
    dividers.push(TOTAL_PERCENT);

    let mut last = 0;
    Ok(dividers
        .into_iter()
        .map(|d| {
            let pct = d - last;
            last = d;
            pct
        })
        .collect())
}

/// Produces random percentage splits over a random number of accounts.
pub struct SplitFeeder {
    config: SplitConfig,
    rng: StdRng,
}

impl SplitFeeder {
    pub fn new(config: SplitConfig, rng: StdRng) -> Self {
        SplitFeeder { config, rng }
    }

    pub fn next_split(&mut self) -> Result<SplitSnapshot> {
        let accounts = match self.config.max_accounts {
            0 => 0,
            max => self.rng.gen_range(1..=max),
        };
        Ok(draw_percentages(&mut self.rng, accounts)?
            .into_iter()
            .enumerate()
            .map(|(i, pct)| (format!("{}{}", self.config.account_prefix, i + 1), format!("{pct}%")))
            .collect())
    }
}

/// Produces random fills and the random wait before the next one.
pub struct FillFeeder {
    config: FillConfig,
    min_interval_ms: u64,
    max_interval_ms: u64,
    rng: StdRng,
}

impl FillFeeder {
    pub fn new(config: FillConfig, schedule: &ScheduleConfig, rng: StdRng) -> Self {
        FillFeeder {
            config,
            min_interval_ms: schedule.fill_min_interval_ms,
            max_interval_ms: schedule.fill_max_interval_ms,
            rng,
        }
    }

    pub fn next_fill(&mut self) -> FillSnapshot {
        let ticker = self
            .config
            .tickers
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        let quantity = self.rng.gen_range(1..=self.config.max_quantity);
        let price: f64 = self.rng.r#gen();
        let price = format!("{price:.prec$}$", prec = self.config.price_precision);
        FillSnapshot::new(ticker, price, quantity)
    }

    pub fn next_interval(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_interval_ms..=self.max_interval_ms))
    }
}

/// Sleep for `duration`, waking early once `stop` is set. Returns `false` if stopped.
pub fn sleep_unless_stopped(stop: &AtomicBool, duration: Duration) -> bool {
    const STEP: Duration = Duration::from_millis(50);

    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(STEP.min(deadline - now));
    }
}

/// Publish a new split immediately and then every `interval` until stopped.
pub fn spawn_split_feed(
    mut feeder: SplitFeeder,
    slot: LatestSlot<SplitSnapshot>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("split-feed".into())
        .spawn(move || {
            loop {
                let split = match feeder.next_split() {
                    Ok(split) => split,
                    Err(e) => {
                        error!("split feeder stopped: {e}");
                        break;
                    }
                };
                info!(
                    "New account split: {}",
                    split
                        .iter()
                        .map(|(a, p)| format!("{a}={p}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                slot.publish(split);
                if !sleep_unless_stopped(&stop, interval) {
                    break;
                }
            }
        })
        .map_err(|e| Error::Feed(format!("failed to start split feeder: {e}")))
}

/// Publish a new fill immediately and then after each random interval until stopped.
pub fn spawn_fill_feed(
    mut feeder: FillFeeder,
    slot: LatestSlot<FillSnapshot>,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("fill-feed".into())
        .spawn(move || {
            loop {
                let fill = feeder.next_fill();
                info!(
                    "New trade fill: {} {} @ {}",
                    fill.quantity, fill.ticker, fill.price
                );
                slot.publish(fill);
                let wait = feeder.next_interval();
                if !sleep_unless_stopped(&stop, wait) {
                    break;
                }
            }
        })
        .map_err(|e| Error::Feed(format!("failed to start fill feeder: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn percentages_sum_to_100() {
        let mut rng = rng();
        for accounts in 1..=99 {
            let pcts = draw_percentages(&mut rng, accounts).unwrap();
            assert_eq!(pcts.len(), accounts);
            assert_eq!(pcts.iter().sum::<u32>(), 100);
            assert!(pcts.iter().all(|&p| p > 0));
        }
    }

    #[test]
    fn single_account_gets_everything() {
        assert_eq!(draw_percentages(&mut rng(), 1).unwrap(), [100]);
    }

    #[test]
    fn account_count_out_of_range_is_an_error() {
        assert!(matches!(draw_percentages(&mut rng(), 0), Err(Error::Feed(_))));
        assert!(matches!(draw_percentages(&mut rng(), 101), Err(Error::Feed(_))));

        let config = SplitConfig {
            max_accounts: 0,
            ..SplitConfig::default()
        };
        assert!(SplitFeeder::new(config, rng()).next_split().is_err());
    }

    #[test]
    fn split_feeder_names_accounts_and_parses() {
        let mut feeder = SplitFeeder::new(SplitConfig::default(), rng());
        for _ in 0..50 {
            let split = feeder.next_split().unwrap();
            assert!((1..=10).contains(&split.len()));
            let (first, _) = split.iter().next().unwrap();
            assert_eq!(first.as_str(), "account1");
            let parsed = split.parse().unwrap();
            assert!((parsed.total_percent() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn fill_feeder_respects_config() {
        let config = FillConfig {
            tickers: vec!["AXA".into(), "KRUK".into()],
            max_quantity: 50,
            price_precision: 2,
        };
        let mut feeder = FillFeeder::new(config, &ScheduleConfig::default(), rng());
        for _ in 0..100 {
            let fill = feeder.next_fill();
            assert!(fill.ticker == "AXA" || fill.ticker == "KRUK");
            assert!((1..=50).contains(&fill.quantity));
            assert!(fill.price.ends_with('$'));
            assert!(fill.parse().is_ok());

            let wait = feeder.next_interval();
            assert!(wait >= Duration::from_secs(1) && wait <= Duration::from_secs(10));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SplitFeeder::new(SplitConfig::default(), rng());
        let mut b = SplitFeeder::new(SplitConfig::default(), rng());
        for _ in 0..10 {
            assert_eq!(a.next_split().unwrap(), b.next_split().unwrap());
        }
    }

    #[test]
    fn slot_keeps_only_latest() {
        let slot = LatestSlot::new();
        assert_eq!(slot.latest(), None::<u32>);
        slot.publish(1);
        slot.clone().publish(2);
        assert_eq!(slot.latest(), Some(2));
    }

    #[test]
    fn sleep_returns_early_when_stopped() {
        let stop = AtomicBool::new(true);
        let start = Instant::now();
        assert!(!sleep_unless_stopped(&stop, Duration::from_secs(60)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn feed_threads_publish_and_stop() {
        let stop = Arc::new(AtomicBool::new(false));
        let split_slot = LatestSlot::new();
        let fill_slot = LatestSlot::new();

        let schedule = ScheduleConfig {
            fill_min_interval_ms: 5,
            fill_max_interval_ms: 10,
            ..ScheduleConfig::default()
        };
        let h1 = spawn_split_feed(
            SplitFeeder::new(SplitConfig::default(), rng()),
            split_slot.clone(),
            Duration::from_millis(10),
            Arc::clone(&stop),
        )
        .unwrap();
        let h2 = spawn_fill_feed(
            FillFeeder::new(FillConfig::default(), &schedule, rng()),
            fill_slot.clone(),
            Arc::clone(&stop),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);
        h1.join().unwrap();
        h2.join().unwrap();

        assert!(split_slot.latest().is_some());
        assert!(fill_slot.latest().is_some());
    }
}
