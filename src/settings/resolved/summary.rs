use super::ResolvedConfig;

pub(super) fn print_summary(config: &ResolvedConfig) {
	println!("Effective configuration:");
	println!("  Root index: {}", config.root_index);
	println!("  Records: {}", config.records.display());
	match &config.base_url {
		Some(url) => println!("  Base URL: {url}"),
		None => println!("  Base URL: (query string only)"),
	}
	if let Some(url) = &config.url {
		println!("  Routed URL: {url}");
	}
	println!("  Stalled delay: {}ms", config.stalled_delay.as_millis());
	println!("  Timeout: {}ms", config.timeout.as_millis());
	if config.widgets.is_empty() {
		println!("  Widgets: (none)");
	} else {
		let types: Vec<&str> = config
			.widgets
			.iter()
			.map(|widget| widget.widget_type())
			.collect();
		println!("  Widgets: {}", types.join(", "));
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;
	use std::time::Duration;

	use facetree_widgets::WidgetSpec;

	use super::*;

	#[test]
	fn summary_prints_without_panic() {
		let config = ResolvedConfig {
			root_index: "products".into(),
			records: PathBuf::from("/tmp/products.json"),
			base_url: None,
			url: Some("?products%5Bquery%5D=phone".into()),
			stalled_delay: Duration::from_millis(200),
			timeout: Duration::from_secs(10),
			widgets: vec![WidgetSpec::SearchBox, WidgetSpec::Hits],
		};

		print_summary(&config);
	}
}
