use crate::search_types::{AvailableSite, SearchResults};

/// How many sites are listed individually before truncating.
const MAX_LISTED_SITES: usize = 5;

/// Subject line for an availability notification.
pub fn notification_subject(results: &SearchResults) -> String {
    format!("{} Availability Update", results.campground_name)
}

/// Plain-text notification body.
pub fn notification_text_body(results: &SearchResults) -> String {
    let site_list = text_site_list(&results.available_sites);

    format!(
        r#"Great news! Campsites are available at {}:

{}

Total available nights: {}

Book soon - sites go fast.
"#,
        results.campground_name, site_list, results.total_available_nights
    )
}

fn text_site_list(sites: &[AvailableSite]) -> String {
    let lines: Vec<String> = sites
        .iter()
        .take(MAX_LISTED_SITES)
        .map(|site| {
            format!(
                "- {} ({}) on {}\n  {}",
                site.campsite_site_name,
                site.facility_name,
                site.booking_date.format("%B %d, %Y"),
                site.booking_url
            )
        })
        .collect();

    if sites.len() > MAX_LISTED_SITES {
        format!(
            "{} sites available (showing first {}):\n{}",
            sites.len(),
            MAX_LISTED_SITES,
            lines.join("\n")
        )
    } else {
        lines.join("\n")
    }
}

/// HTML alternative notification body.
pub fn notification_html_body(results: &SearchResults) -> String {
    let rows: String = results
        .available_sites
        .iter()
        .take(MAX_LISTED_SITES)
        .map(|site| {
            format!(
                r#"<li style="margin-bottom: 8px;">
                    <a href="{}" style="color: #4a6741; font-weight: bold;">{}</a>
                    ({}) on {}
                </li>"#,
                site.booking_url,
                html_escape(&site.campsite_site_name),
                html_escape(&site.facility_name),
                site.booking_date.format("%B %d, %Y")
            )
        })
        .collect();

    let truncation_note = if results.available_sites.len() > MAX_LISTED_SITES {
        format!(
            r#"<p style="color: #6b7280;">...and {} more.</p>"#,
            results.available_sites.len() - MAX_LISTED_SITES
        )
    } else {
        String::new()
    };

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
    <div style="background: linear-gradient(135deg, #2c3e50 0%, #4a6741 100%); padding: 20px; text-align: center;">
        <h1 style="color: white; margin: 0;">Campsite Availability</h1>
    </div>
    <div style="padding: 30px; background: white;">
        <h2 style="color: #2c3e50;">{}</h2>
        <p style="font-size: 16px; line-height: 1.6; color: #374151;">
            New campsites are available for your monitored campground.
        </p>
        <ul style="font-size: 15px; color: #374151;">
            {}
        </ul>
        {}
        <p style="font-size: 14px; color: #6b7280;">
            Total available nights: {}
        </p>
    </div>
</body>
</html>"#,
        html_escape(&results.campground_name),
        rows,
        truncation_note,
        results.total_available_nights
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
