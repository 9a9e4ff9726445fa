//! Execution stages and the transition table.
//!
//! ```text
//! START -> AgentStep
//! AgentStep --continue_reasoning--> AgentStep
//! AgentStep --execute_tools-------> ToolExec
//! AgentStep --terminate-----------> End
//! ToolExec  ----------------------> AgentStep
//! ```

use crate::router::Route;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    AgentStep,
    ToolExec,
    End,
}

impl Stage {
    /// Stage a turn starts in, after the inbound message is seeded.
    pub const START: Stage = Stage::AgentStep;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentStep => "agent_step",
            Self::ToolExec => "tool_exec",
            Self::End => "end",
        }
    }

    /// Next stage given the router verdict on the state this stage produced.
    pub fn next(self, route: Route) -> Stage {
        match (self, route) {
            (Self::AgentStep, Route::ContinueReasoning) => Self::AgentStep,
            (Self::AgentStep, Route::ExecuteTools) => Self::ToolExec,
            (Self::AgentStep, Route::Terminate) => Self::End,
            (Self::ToolExec, _) => Self::AgentStep,
            (Self::End, _) => Self::End,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        assert_eq!(Stage::START, Stage::AgentStep);
        assert_eq!(Stage::AgentStep.next(Route::ContinueReasoning), Stage::AgentStep);
        assert_eq!(Stage::AgentStep.next(Route::ExecuteTools), Stage::ToolExec);
        assert_eq!(Stage::AgentStep.next(Route::Terminate), Stage::End);
        for r in [Route::ContinueReasoning, Route::ExecuteTools, Route::Terminate] {
            assert_eq!(Stage::ToolExec.next(r), Stage::AgentStep);
            assert_eq!(Stage::End.next(r), Stage::End);
        }
    }
}
