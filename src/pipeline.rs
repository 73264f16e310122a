//! Query pipeline - search, assemble, analyze

use serde::Serialize;

use crate::agent::{AnalysisAgent, AnalysisResponse};
use crate::context::assemble;
use crate::error::Result;
use crate::gateway::{RetrievalResult, StoreGateway};

/// Outcome of one question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Collection exists but nothing was retrieved; the agent is not called
    NoMatches,
    Analyzed {
        retrieved: RetrievalResult,
        response: AnalysisResponse,
    },
}

pub struct LogAnalyst {
    gateway: StoreGateway,
    agent: AnalysisAgent,
}

impl LogAnalyst {
    pub fn new(gateway: StoreGateway, agent: AnalysisAgent) -> Self {
        Self { gateway, agent }
    }

    pub fn gateway_mut(&mut self) -> &mut StoreGateway {
        &mut self.gateway
    }

    /// Answer `question` over the `k` most similar stored logs
    ///
    /// Fails only on retrieval errors such as [`crate::Error::StoreNotFound`];
    /// analysis problems come back inside the response.
    pub fn ask(&mut self, question: &str, k: usize) -> Result<QueryOutcome> {
        let retrieved = self.gateway.search(question, k)?;
        if retrieved.is_empty() {
            return Ok(QueryOutcome::NoMatches);
        }

        let request = assemble(question, &retrieved);
        let response = self.agent.analyze(&request);

        Ok(QueryOutcome::Analyzed {
            retrieved,
            response,
        })
    }
}
