use minter_primitives::prelude::*;
use minter_resolver::ResolverConfig;

/// Identity and secrets of the depositor, plus the resolver settings used for monitoring.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub eth_address: EthAddress,
    pub mina_address: MinaAddress,
    pub code_verifier: CodeVerifier,
    pub resolver: ResolverConfig,
}

impl OrchestratorConfig {
    pub fn new(
        eth_address: EthAddress,
        mina_address: MinaAddress,
        code_verifier: CodeVerifier,
    ) -> Self {
        Self {
            eth_address,
            mina_address,
            code_verifier,
            resolver: ResolverConfig::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }
}
