use std::fmt::Write;
use crate::advice::classify;
use crate::errors::ReportError;
use crate::models::forecast::ForecastRecord;

/// A rendered report ready for delivery
#[derive(Debug)]
pub struct Report {
    pub subject: String,
    pub html: String,
    pub text: String,
}

const STYLE: &str = "
        body { font-family: sans-serif; margin: 20px; }
        h1 { color: #333; }
        h2 { color: #555; }
        table { border-collapse: collapse; width: 100%; margin-bottom: 20px; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }
        .uv-today { padding: 10px; border-radius: 5px; }
        .footer { font-size: 0.8em; color: #777; margin-top: 30px; }";

/// Renders the forecast report.
///
/// The first record is taken as today and gets the full advisory text, every record
/// then appears in the weekly outlook with the band name only.
///
/// # Arguments
///
/// * 'location' - location label of the forecast
/// * 'records' - freshly fetched records in date order
/// * 'source_url' - link to the data provider for the footer
pub fn render(location: &str, records: &[ForecastRecord], source_url: &str) -> Result<Report, ReportError> {
    let today = records.first().ok_or(ReportError::EmptyForecast)?;
    let advice = classify(today.uv_index)?;

    let subject = format!("UV Forecast for {} - {}", location, today.date.format("%A, %B %d, %Y"));

    // Infallible, writes go to a String
    let mut html = String::new();
    let _ = write!(html, "<html>\n<head>\n    <style>{}\n    </style>\n</head>\n<body>\n", STYLE);
    let _ = write!(html, "    <h1>UV Forecast for {}</h1>\n", escape(location));
    let _ = write!(html, "    <h2>Today's Forecast ({})</h2>\n", today.date.format("%A, %B %d, %Y"));
    let _ = write!(html, "    <div class=\"uv-today\" style=\"background-color:{}; color:{}\">\n",
                   advice.color.hex, advice.color.contrast.css());
    let _ = write!(html, "        <p><strong>UV Index: {}</strong></p>\n", today.uv_index);
    let _ = write!(html, "        <p>{}</p>\n", advice.label);
    let _ = write!(html, "        <p>Ozone Column: {} DU</p>\n    </div>\n", ozone(today.ozone_column));

    let _ = write!(html, "    <h2>Weekly Outlook</h2>\n    <table>\n");
    let _ = write!(html, "        <tr><th>Date</th><th>UV Index</th><th>Ozone Column (DU)</th><th>Protection Advice</th></tr>\n");

    let mut text = String::new();
    let _ = write!(text, "UV Forecast for {}\n\n", location);
    let _ = write!(text, "Today ({}): UV Index {}\n{}\n", today.date.format("%A, %B %d, %Y"), today.uv_index, advice.label);
    let _ = write!(text, "Ozone Column: {} DU\n\nWeekly Outlook\n", ozone(today.ozone_column));

    for r in records {
        let a = classify(r.uv_index)?;
        let _ = write!(html, "        <tr><td>{}</td><td style=\"background-color:{}; color:{}\">{}</td><td>{}</td><td>{}</td></tr>\n",
                       r.date.format("%A, %b %d"), a.color.hex, a.color.contrast.css(),
                       r.uv_index, ozone(r.ozone_column), a.band.name());
        let _ = write!(text, "{:<18} UV {:>5.1}  Ozone {:>6}  {}\n",
                       r.date.format("%A, %b %d").to_string(), r.uv_index, ozone(r.ozone_column), a.band.name());
    }

    let _ = write!(html, "    </table>\n    <p class=\"footer\">Data sourced from the <a href=\"{}\">Royal Netherlands Meteorological Institute</a>. Stay safe!</p>\n</body>\n</html>\n",
                   escape(source_url));
    let _ = write!(text, "\nData sourced from the Royal Netherlands Meteorological Institute ({}). Stay safe!\n", source_url);

    Ok(Report { subject, html, text })
}

fn ozone(value: Option<f64>) -> String {
    value.map_or("n/a".to_string(), |o| format!("{:.1}", o))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const URL: &str = "https://www.temis.nl/uvradiation/nrt/uvindex.php?lon=-118.02&lat=35.12";

    fn rec(day: u32, uv: f64, ozone: Option<f64>) -> ForecastRecord {
        ForecastRecord { date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(), uv_index: uv, ozone_column: ozone }
    }

    #[test]
    fn empty_forecast_is_an_error() {
        assert!(matches!(render("Somewhere", &[], URL), Err(ReportError::EmptyForecast)));
    }

    #[test]
    fn today_section_uses_first_record() {
        let report = render("Ridgecrest", &[rec(3, 6.2, Some(310.44)), rec(4, 11.3, None)], URL).unwrap();
        assert_eq!(report.subject, "UV Forecast for Ridgecrest - Monday, June 03, 2024");
        assert!(report.html.contains("Today's Forecast (Monday, June 03, 2024)"));
        assert!(report.html.contains("High (6-7): Protection needed."));
        assert!(report.html.contains("background-color:#f8b600; color:black"));
        assert!(report.html.contains("Ozone Column: 310.4 DU"));
    }

    #[test]
    fn outlook_lists_every_record_with_band_name() {
        let report = render("Ridgecrest", &[rec(3, 6.2, Some(310.4)), rec(4, 11.3, None)], URL).unwrap();
        assert!(report.html.contains("<td>Monday, Jun 03</td>"));
        assert!(report.html.contains("<td>Tuesday, Jun 04</td>"));
        assert!(report.html.contains("background-color:#b54cff; color:white\">11.3</td><td>n/a</td><td>Extreme</td>"));
        assert!(!report.html.contains("<td>Extreme (11+)"));
        assert!(report.text.contains("Extreme"));
        assert!(report.html.contains("lon=-118.02&amp;lat=35.12"));
    }

    #[test]
    fn location_is_escaped() {
        let report = render("<b>Here</b>", &[rec(3, 1.0, None)], URL).unwrap();
        assert!(report.html.contains("UV Forecast for &lt;b&gt;Here&lt;/b&gt;"));
    }
}
