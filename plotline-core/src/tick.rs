//! World Tick Service — debounced background consequence evaluation.
//!
//! Fast-path actions are buffered per session; a debounce timer fires the
//! evaluation once the burst goes quiet. Skip heuristics avoid paying for
//! generation when nothing could plausibly react, a literal "none" or
//! too-short response means no reaction, and a small independent chance
//! produces a proactive NPC action. Everything is fire-and-forget: errors
//! are logged at the boundary and never reach the turn path.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::TickConfig;
use crate::error::Result;
use crate::events::TurnEvent;
use crate::generate::TextGenerator;
use crate::store::DocumentStore;
use crate::types::{ActionKind, SessionId, Tension};

/// Callback receiving world-reaction events for delivery to the client.
pub type ReactionSink = Arc<dyn Fn(TurnEvent) + Send + Sync>;

/// One buffered fast-path action.
#[derive(Debug, Clone)]
pub struct TickAction {
    /// Classified action type.
    pub action: ActionKind,
    /// The raw player input that produced it.
    pub input: String,
}

/// Scene snapshot captured at check time.
#[derive(Debug, Clone, Default)]
pub struct TickContext {
    /// Scene tension when the action landed.
    pub tension: Tension,
    /// Names of NPCs present.
    pub npcs: Vec<String>,
    /// Current scene summary, for the evaluation prompt.
    pub summary: String,
}

struct Pending {
    generation: u64,
    actions: Vec<TickAction>,
    ctx: TickContext,
    sink: ReactionSink,
}

/// Per-session debounce registry and evaluator.
///
/// Entries are created on first use and evicted when a tick fires or is
/// cancelled; the registry never leaks sessions.
pub struct WorldTicker {
    cfg: TickConfig,
    pending: Arc<DashMap<SessionId, Pending>>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn DocumentStore>,
}

impl WorldTicker {
    /// Create a ticker over the given collaborators.
    #[must_use]
    pub fn new(
        cfg: TickConfig,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            cfg,
            pending: Arc::new(DashMap::new()),
            generator,
            store,
        }
    }

    /// Buffer one action and (re)arm the session's debounce timer.
    ///
    /// The evaluation runs once, `debounce_ms` after the last action in the
    /// burst, covering every buffered action. The latest snapshot and sink
    /// win.
    pub fn check(
        &self,
        session: SessionId,
        action: TickAction,
        ctx: TickContext,
        sink: ReactionSink,
    ) {
        let generation = {
            let mut entry = self.pending.entry(session).or_insert_with(|| Pending {
                generation: 0,
                actions: Vec::new(),
                ctx: TickContext::default(),
                sink: Arc::clone(&sink),
            });
            entry.generation += 1;
            entry.actions.push(action);
            entry.ctx = ctx;
            entry.sink = sink;
            entry.generation
        };

        let cfg = self.cfg.clone();
        let pending = Arc::clone(&self.pending);
        let generator = Arc::clone(&self.generator);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(cfg.debounce_ms)).await;
            // A newer action re-armed the timer; this wakeup is stale.
            let Some((_, fired)) = pending.remove_if(&session, |_, p| p.generation == generation)
            else {
                return;
            };
            if let Err(err) =
                evaluate(&cfg, generator.as_ref(), store.as_ref(), session, fired).await
            {
                warn!(%session, error = %err, "world tick evaluation failed");
            }
        });
    }

    /// Drop any pending tick for the session, timer and buffer both.
    ///
    /// Called when a higher-tier turn takes over, so stale reactions never
    /// arrive after a scene change.
    pub fn cancel(&self, session: SessionId) {
        if self.pending.remove(&session).is_some() {
            debug!(%session, "cancelled pending world tick");
        }
    }

    /// Number of sessions with a pending tick, for tests and introspection.
    #[must_use]
    pub fn pending_sessions(&self) -> usize {
        self.pending.len()
    }
}

/// Whether the buffered batch deserves a generation call.
///
/// `roll` is a uniform sample in `[0, 1)`; quiet actions in a calm scene
/// with company still evaluate at `liveliness_chance` so the world
/// occasionally stirs on its own.
fn should_evaluate(cfg: &TickConfig, actions: &[TickAction], ctx: &TickContext, roll: f64) -> bool {
    let calm = ctx.tension == Tension::Calm;
    let alone = ctx.npcs.is_empty();
    if calm && alone {
        return false;
    }
    let all_quiet = actions.iter().all(|a| a.action.is_quiet());
    if all_quiet && calm {
        return roll < f64::from(cfg.liveliness_chance);
    }
    true
}

async fn evaluate(
    cfg: &TickConfig,
    generator: &dyn TextGenerator,
    store: &dyn DocumentStore,
    session: SessionId,
    fired: Pending,
) -> Result<()> {
    let Pending {
        actions, ctx, sink, ..
    } = fired;

    let (liveliness_roll, proactive_roll) = {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0))
    };

    if should_evaluate(cfg, &actions, &ctx, liveliness_roll) {
        let prompt = reaction_prompt(&actions, &ctx);
        match generator.complete(REACTION_SYSTEM, &prompt).await {
            Ok(text) => {
                let text = text.trim();
                if is_reaction(cfg, text) {
                    sink(TurnEvent::WorldReaction {
                        text: text.to_string(),
                    });
                    store
                        .append_log(
                            session,
                            json!({
                                "kind": "world_reaction",
                                "text": text,
                                "at": chrono::Utc::now().to_rfc3339(),
                            }),
                        )
                        .await?;
                }
            }
            Err(err) => warn!(%session, error = %err, "reaction check failed"),
        }
    }

    // Proactive NPC action: independent of the reaction check, an NPC may
    // pursue its own goal.
    if !ctx.npcs.is_empty() && proactive_roll < f64::from(cfg.proactive_chance) {
        let prompt = proactive_prompt(&ctx);
        match generator.complete(PROACTIVE_SYSTEM, &prompt).await {
            Ok(text) => {
                let text = text.trim();
                if is_reaction(cfg, text) {
                    sink(TurnEvent::WorldReaction {
                        text: text.to_string(),
                    });
                    store
                        .append_log(
                            session,
                            json!({
                                "kind": "proactive_action",
                                "text": text,
                                "at": chrono::Utc::now().to_rfc3339(),
                            }),
                        )
                        .await?;
                }
            }
            Err(err) => warn!(%session, error = %err, "proactive action failed"),
        }
    }
    Ok(())
}

/// A response counts as a reaction unless it is a literal "none" or too
/// short to narrate.
fn is_reaction(cfg: &TickConfig, text: &str) -> bool {
    !text.eq_ignore_ascii_case("none")
        && !text.eq_ignore_ascii_case("none.")
        && text.chars().count() >= cfg.min_reaction_chars
}

const REACTION_SYSTEM: &str = "You narrate how bystanders react to a player's recent actions. \
If nobody would plausibly react, respond with the single word: none.";

const PROACTIVE_SYSTEM: &str = "You narrate one NPC advancing their own goal, independent of the \
player. If nothing would happen, respond with the single word: none.";

fn reaction_prompt(actions: &[TickAction], ctx: &TickContext) -> String {
    let recent: Vec<&str> = actions.iter().map(|a| a.input.as_str()).collect();
    format!(
        "Scene: {}\nTension: {}\nPresent: {}\nRecent player actions: {}\nDoes anyone react?",
        ctx.summary,
        ctx.tension,
        ctx.npcs.join(", "),
        recent.join("; "),
    )
}

fn proactive_prompt(ctx: &TickContext) -> String {
    format!(
        "Scene: {}\nPresent: {}\nPick one NPC and narrate a small action serving their own goal.",
        ctx.summary,
        ctx.npcs.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::error::CoreError;
    use crate::store::InMemoryStore;

    struct CountingGenerator {
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
        reply: String,
    }

    impl CountingGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        async fn complete(&self, _system: &str, prompt: &str) -> crate::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock() = prompt.to_string();
            if prompt.is_empty() {
                return Err(CoreError::TextGen("empty".into()));
            }
            Ok(self.reply.clone())
        }
    }

    fn quiet_action() -> TickAction {
        TickAction {
            action: ActionKind::GridMove,
            input: "I walk north".into(),
        }
    }

    fn loud_action() -> TickAction {
        TickAction {
            action: ActionKind::SkillAction,
            input: "I flip the table".into(),
        }
    }

    fn tense_company() -> TickContext {
        TickContext {
            tension: Tension::Tense,
            npcs: vec!["Mira".into()],
            summary: "A hush falls over the taproom.".into(),
        }
    }

    fn collecting_sink() -> (ReactionSink, Arc<Mutex<Vec<TurnEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let sink: ReactionSink = Arc::new(move |event| captured.lock().push(event));
        (sink, events)
    }

    fn no_proactive() -> TickConfig {
        TickConfig {
            proactive_chance: 0.0,
            ..TickConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_checks_evaluates_exactly_once() {
        let generator = CountingGenerator::new("The barkeep eyes you and reaches under the counter.");
        let store = Arc::new(InMemoryStore::new());
        let ticker = WorldTicker::new(no_proactive(), generator.clone(), store.clone());
        let session = SessionId::new();
        let (sink, events) = collecting_sink();

        let inputs = ["I flip the table", "I draw my knife", "I shout a challenge"];
        for input in inputs {
            let action = TickAction {
                action: ActionKind::SkillAction,
                input: input.into(),
            };
            ticker.check(session, action, tense_company(), Arc::clone(&sink));
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(700)).await;
        tokio::task::yield_now().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.lock().len(), 1);
        assert_eq!(ticker.pending_sessions(), 0, "entry evicted after firing");
        assert_eq!(store.log_entries(session).len(), 1);

        // The single evaluation covered the whole burst.
        let prompt = generator.last_prompt.lock().clone();
        for input in inputs {
            assert!(prompt.contains(input), "buffered action {input:?} missing from the prompt");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_calm_empty_never_evaluates() {
        let generator = CountingGenerator::new("should never be asked");
        let store = Arc::new(InMemoryStore::new());
        let ticker = WorldTicker::new(TickConfig::default(), generator.clone(), store);
        let (sink, events) = collecting_sink();

        for _ in 0..100 {
            let session = SessionId::new();
            ticker.check(session, quiet_action(), TickContext::default(), Arc::clone(&sink));
        }
        tokio::time::sleep(Duration::from_millis(700)).await;
        tokio::task::yield_now().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(events.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_clears_timer_and_buffer() {
        let generator = CountingGenerator::new("too late");
        let store = Arc::new(InMemoryStore::new());
        let ticker = WorldTicker::new(no_proactive(), generator.clone(), store);
        let session = SessionId::new();
        let (sink, _events) = collecting_sink();

        ticker.check(session, loud_action(), tense_company(), sink);
        assert_eq!(ticker.pending_sessions(), 1);
        ticker.cancel(session);
        assert_eq!(ticker.pending_sessions(), 0);

        tokio::time::sleep(Duration::from_millis(700)).await;
        tokio::task::yield_now().await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn none_and_short_replies_are_suppressed() {
        for reply in ["none", "None.", "Hm."] {
            let generator = CountingGenerator::new(reply);
            let store = Arc::new(InMemoryStore::new());
            let ticker = WorldTicker::new(no_proactive(), generator.clone(), store.clone());
            let session = SessionId::new();
            let (sink, events) = collecting_sink();

            ticker.check(session, loud_action(), tense_company(), sink);
            tokio::time::sleep(Duration::from_millis(700)).await;
            tokio::task::yield_now().await;

            assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
            assert!(events.lock().is_empty(), "reply {reply:?} leaked");
            assert!(store.log_entries(session).is_empty());
        }
    }

    #[test]
    fn skip_heuristics() {
        let cfg = TickConfig::default();
        let quiet = vec![quiet_action()];
        let loud = vec![loud_action()];

        // Calm and alone: always skip, quiet or not.
        assert!(!should_evaluate(&cfg, &loud, &TickContext::default(), 0.0));

        // Quiet, calm, with company: mostly skip, sometimes alive.
        let company = TickContext {
            npcs: vec!["Mira".into()],
            ..TickContext::default()
        };
        assert!(should_evaluate(&cfg, &quiet, &company, 0.0));
        assert!(!should_evaluate(&cfg, &quiet, &company, 0.99));

        // Loud actions with company always evaluate.
        assert!(should_evaluate(&cfg, &loud, &company, 0.99));

        // Elevated tension always evaluates, even quiet and alone... with
        // company absent the reaction has no actor, but tension wins.
        let tense = TickContext {
            tension: Tension::Tense,
            ..TickContext::default()
        };
        assert!(should_evaluate(&cfg, &quiet, &tense, 0.99));
    }
}
