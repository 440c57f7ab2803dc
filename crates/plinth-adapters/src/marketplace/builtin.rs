//! The marketplace listing shipped with the binary.

use plinth_core::{
    application::ports::Marketplace,
    domain::{MarketplacePlugin, Tags},
    error::CoreResult,
};

struct Entry {
    name: &'static str,
    module: &'static str,
    cli_module: Option<&'static str>,
    package: &'static str,
    description: &'static str,
    tags: &'static str,
}

const ENTRIES: &[Entry] = &[
    Entry {
        name: "FileDb",
        module: "FileDb",
        cli_module: None,
        package: "@jovotech/db-filedb",
        description: "Store user data in a local JSON file for fast prototyping and debugging",
        tags: "databases",
    },
    Entry {
        name: "DynamoDb",
        module: "DynamoDb",
        cli_module: None,
        package: "@jovotech/db-dynamodb",
        description: "Store user data to AWS DynamoDb",
        tags: "databases",
    },
    Entry {
        name: "Jovo Core Platform",
        module: "CorePlatform",
        cli_module: None,
        package: "@jovotech/platform-core",
        description: "Build voice experiences for custom devices",
        tags: "platforms",
    },
    Entry {
        name: "Amazon Alexa",
        module: "AlexaPlatform",
        cli_module: Some("AlexaCli"),
        package: "@jovotech/platform-alexa",
        description: "Build apps for Amazon Alexa",
        tags: "platforms",
    },
    Entry {
        name: "ExpressJs",
        module: "express",
        cli_module: None,
        package: "@jovotech/server-express",
        description: "ExpressJs Server",
        tags: "server",
    },
    Entry {
        name: "AWS Lambda",
        module: "lambda",
        cli_module: None,
        package: "@jovotech/server-lambda",
        description: "Serverless hosting solution by AWS",
        tags: "server",
    },
];

/// Fixed listing of the plugins the CLI knows about.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMarketplace;

impl BuiltinMarketplace {
    pub fn new() -> Self {
        Self
    }
}

impl Marketplace for BuiltinMarketplace {
    fn plugins(&self) -> CoreResult<Vec<MarketplacePlugin>> {
        Ok(ENTRIES
            .iter()
            .map(|e| MarketplacePlugin {
                name: e.name.to_string(),
                module: e.module.to_string(),
                package: e.package.to_string(),
                cli_module: e.cli_module.map(str::to_string),
                description: e.description.to_string(),
                tags: Tags::parse(e.tags),
            })
            .collect())
    }
}
