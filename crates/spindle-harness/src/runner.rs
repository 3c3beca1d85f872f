//! Soak-case execution over the public `spindle-core` API.
//!
//! Each case is a standalone function that drives [`Thread`] and
//! [`TlsSlot`] through one failure-prone pattern: spawn storms, exit-code
//! fidelity, the startup handshake, cross-thread TLS isolation, handle
//! reuse, and naming. Cases return `Ok(())` or a human-readable reason for
//! the failure; the runner turns those into structured log events and
//! [`CaseResult`]s.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use spindle_core::{Thread, TlsSlot};

use crate::config::SoakParams;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

// ---------------------------------------------------------------------------
// Results and the runner
// ---------------------------------------------------------------------------

/// Outcome of one soak case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

type CaseFn = fn(&SoakParams) -> Result<(), String>;

const CASES: [(&str, CaseFn); 6] = [
    ("spawn_join_storm", spawn_join_storm),
    ("exit_code_matrix", exit_code_matrix),
    ("startup_handshake", startup_handshake),
    ("tls_isolation", tls_isolation),
    ("reinit_cycle", reinit_cycle),
    ("naming_smoke", naming_smoke),
];

/// Executes the soak cases and collects per-case results.
pub struct SoakRunner {
    campaign: String,
    params: SoakParams,
}

impl SoakRunner {
    #[must_use]
    pub fn new(campaign: impl Into<String>, params: SoakParams) -> Self {
        Self {
            campaign: campaign.into(),
            params,
        }
    }

    /// Run every case in order, emitting one log event per case plus
    /// begin/end markers.
    pub fn run(&self, emitter: &mut LogEmitter) -> std::io::Result<Vec<CaseResult>> {
        emitter.emit(LogLevel::Info, "soak.begin")?;

        let mut results = Vec::with_capacity(CASES.len());
        for (name, case) in CASES {
            let started = Instant::now();
            let verdict = case(&self.params);
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let passed = verdict.is_ok();
            let detail = verdict.err();

            let level = if passed { LogLevel::Info } else { LogLevel::Error };
            let mut entry = LogEntry::new("", level, "soak.case")
                .with_case(name)
                .with_outcome(if passed { Outcome::Pass } else { Outcome::Fail })
                .with_elapsed_ms(elapsed_ms);
            if let Some(reason) = &detail {
                entry = entry.with_detail(reason.clone());
            }
            emitter.emit_entry(entry)?;

            results.push(CaseResult {
                case_name: name.to_string(),
                passed,
                detail,
                elapsed_ms,
            });
        }

        let failed = results.iter().filter(|result| !result.passed).count();
        let level = if failed == 0 { LogLevel::Info } else { LogLevel::Error };
        let end = LogEntry::new("", level, "soak.end").with_outcome(if failed == 0 {
            Outcome::Pass
        } else {
            Outcome::Fail
        });
        emitter.emit_entry(end)?;
        emitter.flush()?;

        Ok(results)
    }

    /// Campaign name this runner stamps into its results.
    #[must_use]
    pub fn campaign(&self) -> &str {
        &self.campaign
    }
}

// ---------------------------------------------------------------------------
// Worker entry points
// ---------------------------------------------------------------------------

/// Echoes the `i32` behind `user_data` as the worker's exit code.
fn echo_entry(user_data: *mut c_void) -> i32 {
    // SAFETY: every case passes a pointer to an i32 that outlives the join.
    unsafe { *user_data.cast::<i32>() }
}

/// Shared state for workers that must be held inside their entry function
/// while the spawning thread inspects them.
struct HandshakeProbe {
    entered: AtomicU32,
    release: AtomicBool,
}

impl HandshakeProbe {
    fn new() -> Self {
        Self {
            entered: AtomicU32::new(0),
            release: AtomicBool::new(false),
        }
    }
}

fn handshake_entry(user_data: *mut c_void) -> i32 {
    // SAFETY: the probe outlives the join performed by the case.
    let probe = unsafe { &*user_data.cast::<HandshakeProbe>() };
    probe.entered.fetch_add(1, Ordering::SeqCst);
    while !probe.release.load(Ordering::SeqCst) {
        std::thread::yield_now();
    }
    0
}

/// Per-worker TLS workload: stamp a tag into the shared slot, then keep
/// reading it back while the other workers do the same.
struct TlsProbe<'a> {
    slot: &'a TlsSlot,
    tag: usize,
    rounds: u32,
}

fn tls_probe_entry(user_data: *mut c_void) -> i32 {
    // SAFETY: the probe outlives the join performed by the case.
    let probe = unsafe { &*user_data.cast::<TlsProbe<'_>>() };
    probe.slot.set(probe.tag as *mut c_void);
    for _ in 0..probe.rounds {
        if probe.slot.get() as usize != probe.tag {
            return 0;
        }
        std::thread::yield_now();
    }
    1
}

fn user_data<T>(value: &T) -> *mut c_void {
    std::ptr::from_ref(value).cast_mut().cast()
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

/// Spawn a batch of workers per cycle and verify every exit code.
fn spawn_join_storm(params: &SoakParams) -> Result<(), String> {
    for cycle in 0..params.cycles {
        let payloads: Vec<i32> = (0..params.workers)
            .map(|worker| ((cycle % 1_000) as i32) * 1_000 + worker as i32)
            .collect();
        let mut threads: Vec<Thread> = payloads.iter().map(|_| Thread::new()).collect();

        for (thread, payload) in threads.iter_mut().zip(&payloads) {
            // SAFETY: echo_entry reads the payload, which outlives the joins
            // below.
            unsafe { thread.init(echo_entry, user_data(payload), 0, None) };
        }
        for (worker, (mut thread, payload)) in threads.into_iter().zip(&payloads).enumerate() {
            thread.shutdown();
            if thread.exit_code() != *payload {
                return Err(format!(
                    "cycle {cycle} worker {worker}: exit code {} != payload {payload}",
                    thread.exit_code()
                ));
            }
        }
    }
    Ok(())
}

/// Exit codes must round-trip unmangled, including both i32 extremes.
fn exit_code_matrix(_params: &SoakParams) -> Result<(), String> {
    for code in [0, 1, -1, 42, i32::MIN, i32::MAX] {
        let payload = code;
        let mut thread = Thread::new();
        // SAFETY: echo_entry reads the payload, which outlives the join
        // below.
        unsafe { thread.init(echo_entry, user_data(&payload), 0, None) };
        thread.shutdown();
        if thread.exit_code() != code {
            return Err(format!("exit code {code} came back as {}", thread.exit_code()));
        }
    }
    Ok(())
}

/// Init must hand back a running thread whose entry function runs exactly
/// once, even while the worker is still held inside it.
fn startup_handshake(params: &SoakParams) -> Result<(), String> {
    for round in 0..params.cycles.min(64) {
        let probe = HandshakeProbe::new();
        let mut thread = Thread::new();
        // SAFETY: handshake_entry reads the probe, which outlives the join
        // below.
        unsafe { thread.init(handshake_entry, user_data(&probe), 0, None) };
        let running = thread.is_running();

        while probe.entered.load(Ordering::SeqCst) == 0 {
            std::thread::yield_now();
        }
        let entered = probe.entered.load(Ordering::SeqCst);

        probe.release.store(true, Ordering::SeqCst);
        thread.shutdown();

        if !running {
            return Err(format!("round {round}: thread not running after init"));
        }
        if entered != 1 {
            return Err(format!("round {round}: entry ran {entered} times"));
        }
    }
    Ok(())
}

/// Workers hammering one shared slot must never observe each other's value,
/// and the spawning thread's view must stay null throughout.
fn tls_isolation(params: &SoakParams) -> Result<(), String> {
    let slot = TlsSlot::new();
    let probes: Vec<TlsProbe<'_>> = (0..params.workers)
        .map(|worker| TlsProbe {
            slot: &slot,
            tag: 0x1000 + worker as usize * 0x10,
            rounds: params.tls_rounds,
        })
        .collect();
    let mut threads: Vec<Thread> = probes.iter().map(|_| Thread::new()).collect();

    for (thread, probe) in threads.iter_mut().zip(&probes) {
        // SAFETY: tls_probe_entry reads the probe, which outlives the joins
        // below.
        unsafe { thread.init(tls_probe_entry, user_data(probe), 0, None) };
    }
    for (worker, mut thread) in threads.into_iter().enumerate() {
        thread.shutdown();
        if thread.exit_code() != 1 {
            return Err(format!("worker {worker} observed a foreign TLS value"));
        }
    }
    if !slot.get().is_null() {
        return Err("the spawning thread's slot is no longer null".to_string());
    }
    Ok(())
}

/// One handle reused across many init/shutdown rounds must behave like a
/// fresh one every time.
fn reinit_cycle(params: &SoakParams) -> Result<(), String> {
    let mut thread = Thread::new();
    for cycle in 0..params.cycles {
        let payload = (cycle as i32) - 3;
        // SAFETY: echo_entry reads the payload, which outlives the join
        // below.
        unsafe { thread.init(echo_entry, user_data(&payload), 0, None) };
        thread.shutdown();
        if thread.exit_code() != payload {
            return Err(format!(
                "cycle {cycle}: reused handle returned {}",
                thread.exit_code()
            ));
        }
    }
    Ok(())
}

/// Naming is best-effort: neither valid, hostile, nor post-shutdown names
/// may disturb the worker.
fn naming_smoke(_params: &SoakParams) -> Result<(), String> {
    let probe = HandshakeProbe::new();
    let mut thread = Thread::new();
    // SAFETY: handshake_entry reads the probe, which outlives the join below.
    unsafe {
        thread.init(
            handshake_entry,
            user_data(&probe),
            0,
            Some("spindle-soak"),
        );
    }
    thread.set_name("spindle-soak-renamed");
    thread.set_name("a-name-well-past-any-kernel-comm-limit-for-threads");
    thread.set_name("interior\0nul");

    probe.release.store(true, Ordering::SeqCst);
    thread.shutdown();
    thread.set_name("after-shutdown");

    if thread.exit_code() != 0 {
        return Err(format!("named worker exited with {}", thread.exit_code()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
