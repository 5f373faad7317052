// crates/robogate-agent/src/lib.rs
// ============================================================================
// Crate: robogate-agent
// Description: The deterministic planner and agentic tool-calling loop (C4).
// Purpose: Produce proposals from telemetry and a navigation goal, either by
//          a fixed rule set (§4.4.a) or by driving a closed tool set through
//          a backend-agnostic provider (§4.4.b), with bounded memory and
//          bounded replanning.
// ============================================================================

//! # robogate-agent
//!
//! Two planning modes live here: [`planner::plan_tick`], the deterministic
//! rule-based planner used by the control loop every tick, and
//! [`agentic::run_agentic_loop`], the bounded tool-calling loop driven by a
//! [`provider::PlannerProvider`] for synchronous `/agent/propose`-style
//! calls. Neither mode talks to an LLM directly; that lives behind the
//! `PlannerProvider` seam, entirely outside this crate's scope (§2).

pub mod agentic;
pub mod errors;
pub mod memory;
pub mod planner;
pub mod provider;

pub use agentic::AgenticOutcome;
pub use agentic::ThoughtStep;
pub use agentic::run_agentic_loop;
pub use errors::AgentError;
pub use memory::AgentMemory;
pub use memory::MemoryEntry;
pub use memory::MemorySummary;
pub use provider::AgentContext;
pub use provider::AgentTool;
pub use provider::MockPlannerProvider;
pub use provider::PlannerProvider;
