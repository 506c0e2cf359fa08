use anyhow::Result;
use serde_json::json;

use crate::workflow::SearchOutcome;

/// Print the URL, then one line per index with its hit count and widgets.
pub(crate) fn print_plain(outcome: &SearchOutcome) {
	if outcome.url.is_empty() {
		println!("URL: (no refinements)");
	} else {
		println!("URL: {}", outcome.url);
	}

	for index in &outcome.indices {
		let hits = match (&index.error, index.nb_hits) {
			(Some(error), _) => format!("error: {error}"),
			(None, Some(nb_hits)) => format!("{nb_hits} hits"),
			(None, None) => "no results".to_string(),
		};
		let widgets = outcome
			.render_state
			.get(&index.key)
			.map(|state| state.widget_types().collect::<Vec<_>>().join(", "))
			.unwrap_or_default();
		println!("{} ({}): {hits} [{widgets}]", index.key, index.index_name);
	}
}

/// Format the search outcome as a JSON string.
pub(crate) fn format_outcome_json(outcome: &SearchOutcome) -> Result<String> {
	let indices: Vec<_> = outcome
		.indices
		.iter()
		.map(|index| {
			json!({
				"key": index.key,
				"indexName": index.index_name,
				"nbHits": index.nb_hits,
				"error": index.error,
			})
		})
		.collect();

	let payload = json!({
		"url": outcome.url,
		"uiState": outcome.ui_state,
		"renderState": outcome.render_state.as_ref(),
		"indices": indices,
	});

	Ok(serde_json::to_string_pretty(&payload)?)
}

/// Print the JSON representation of the search outcome.
pub(crate) fn print_json(outcome: &SearchOutcome) -> Result<()> {
	println!("{}", format_outcome_json(outcome)?);
	Ok(())
}
