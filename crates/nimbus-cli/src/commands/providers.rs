use anyhow::Result;
use serde::Serialize;

use nimbus_core::ProviderKind;
use nimbus_storage::factory::is_compiled_in;

#[derive(Serialize)]
struct ProviderStatus {
    name: String,
    compiled_in: bool,
}

fn statuses() -> Vec<ProviderStatus> {
    ProviderKind::ALL
        .into_iter()
        .map(|kind| ProviderStatus {
            name: kind.to_string(),
            compiled_in: is_compiled_in(kind),
        })
        .collect()
}

pub fn run(json: bool) -> Result<()> {
    let statuses = statuses();
    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("Providers:");
    for status in &statuses {
        let state = if status.compiled_in {
            "available"
        } else {
            "not compiled in"
        };
        println!("  {:<8} {state}", status.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_kind() {
        let names: Vec<String> = statuses().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["aws", "azure", "gcp", "local"]);
    }
}
