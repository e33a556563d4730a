//! Satisfies `comfygit_nodes::PythonResolutionTester` with a real broker, so
//! the node package manager's install/update pipeline can dry-run a
//! prospective dependency group without depending on this crate directly.

use comfygit_nodes::{NodeError, NodeResult, PythonResolutionTester};

use crate::broker::PythonBroker;

pub struct BrokerResolutionTester<'a> {
    pub broker: &'a PythonBroker,
}

impl<'a> PythonResolutionTester for BrokerResolutionTester<'a> {
    fn test_resolution(&self, group: &str, _requirements: &[String]) -> NodeResult<()> {
        self.broker
            .test_resolution(group)
            .map_err(|source| NodeError::ResolutionFailed { group: group.to_string(), message: source.to_string() })
    }
}
