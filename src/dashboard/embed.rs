// src/dashboard/embed.rs
use super::DashboardData;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Marker the template must contain exactly once.
pub const PLACEHOLDER: &str = "__DASHBOARD_DATA__";

/// Substitute `data` into the template and write the finished page.
///
/// A template without the placeholder is miswired; the run fails instead of
/// writing an unmodified copy.
pub fn embed_into_template(data: &DashboardData, template: &Path, output: &Path) -> Result<()> {
    let html = fs::read_to_string(template)
        .with_context(|| format!("reading template {}", template.display()))?;
    let rendered = render(&html, data)?;
    fs::write(output, rendered).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn render(html: &str, data: &DashboardData) -> Result<String> {
    match html.matches(PLACEHOLDER).count() {
        0 => bail!("template does not contain the {} placeholder", PLACEHOLDER),
        1 => {}
        n => bail!(
            "template contains {} copies of the {} placeholder, expected exactly one",
            n,
            PLACEHOLDER
        ),
    }

    let json = serde_json::to_string(data).context("serializing dashboard data")?;
    Ok(html.replacen(PLACEHOLDER, &format!("const DATA = {};", json), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_data() -> DashboardData {
        DashboardData {
            companies: Vec::new(),
            institutions: Vec::new(),
            market_cap_totals: Vec::new(),
            rd_expenditure: Vec::new(),
            gdp: Vec::new(),
            cities: Vec::new(),
            generated: "2025-08-05T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn substitutes_exactly_once() -> Result<()> {
        let html = "<script>\n__DASHBOARD_DATA__\n</script>";
        let rendered = render(html, &empty_data())?;
        assert!(rendered.contains("const DATA = {"));
        assert!(rendered.contains("\"generated\":\"2025-08-05T00:00:00+00:00\""));
        assert!(!rendered.contains(PLACEHOLDER));
        Ok(())
    }

    #[test]
    fn missing_placeholder_is_fatal() {
        let err = render("<html></html>", &empty_data()).unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn duplicated_placeholder_is_fatal() {
        let html = "__DASHBOARD_DATA__ __DASHBOARD_DATA__";
        let err = render(html, &empty_data()).unwrap_err();
        assert!(err.to_string().contains("expected exactly one"));
    }

    #[test]
    fn writes_through_the_template_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let template = dir.path().join("input.html");
        let output = dir.path().join("index.html");
        fs::write(&template, "<body><script>__DASHBOARD_DATA__</script></body>")?;

        embed_into_template(&empty_data(), &template, &output)?;

        let rendered = fs::read_to_string(&output)?;
        assert!(rendered.starts_with("<body><script>const DATA = {"));
        Ok(())
    }
}
