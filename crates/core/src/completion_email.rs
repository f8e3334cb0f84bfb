//! Completion email formatting.
//!
//! [`render`] turns a [`PrintJob`] into the subject, HTML body and plain-text
//! body of the "your print job is complete" email. It is a pure function and
//! never fails: every absent field is replaced with a display default.

use std::fmt::Write as _;

use crate::job::{PrintFile, PrintJob, PrintSettings};

pub const SUBJECT: &str = "Your Print Job is Complete! 🖨️";

const DEFAULT_COLOR: &str = "black";
const DEFAULT_COPIES: u32 = 1;
const DEFAULT_ORIENTATION: &str = "portrait";
const DEFAULT_PAGE_RANGE: &str = "all";
const DEFAULT_FILE_NAME: &str = "Untitled";
const NOT_AVAILABLE: &str = "N/A";

/// Default paper size when neither the job nor configuration provides one.
pub const DEFAULT_PAPER_SIZE: &str = "A4";

/// Default target of the "View Dashboard" button.
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:5173/dashboard";

// ---------------------------------------------------------------------------
// Options / output
// ---------------------------------------------------------------------------

/// Deployment-specific values substituted into the template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOptions {
    /// Paper size shown when the job does not specify one.
    pub default_paper_size: String,
    /// Link behind the dashboard call-to-action.
    pub dashboard_url: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            default_paper_size: DEFAULT_PAPER_SIZE.to_string(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
        }
    }
}

/// A rendered completion email, not yet addressed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Resolved view of a job
// ---------------------------------------------------------------------------

/// Print settings with every default applied.
struct ResolvedSettings<'a> {
    color: &'a str,
    paper_size: &'a str,
    copies: u32,
    double_sided: bool,
    orientation: &'a str,
    page_range: &'a str,
}

impl<'a> ResolvedSettings<'a> {
    fn resolve(settings: Option<&'a PrintSettings>, options: &'a TemplateOptions) -> Self {
        let s = settings;
        Self {
            color: non_empty(s.and_then(|s| s.color.as_deref())).unwrap_or(DEFAULT_COLOR),
            paper_size: non_empty(s.and_then(|s| s.paper_size.as_deref()))
                .unwrap_or(options.default_paper_size.as_str()),
            copies: s
                .and_then(|s| s.copies)
                .filter(|&c| c > 0)
                .unwrap_or(DEFAULT_COPIES),
            double_sided: s.and_then(|s| s.double_sided).unwrap_or(false),
            orientation: non_empty(s.and_then(|s| s.orientation.as_deref()))
                .unwrap_or(DEFAULT_ORIENTATION),
            page_range: non_empty(s.and_then(|s| s.page_range.as_deref()))
                .unwrap_or(DEFAULT_PAGE_RANGE),
        }
    }

    fn copies_label(&self) -> &'static str {
        if self.copies > 1 {
            "copies"
        } else {
            "copy"
        }
    }

    fn sides_label(&self) -> &'static str {
        if self.double_sided {
            "Double-sided"
        } else {
            "Single-sided"
        }
    }

    fn all_pages(&self) -> bool {
        self.page_range.eq_ignore_ascii_case(DEFAULT_PAGE_RANGE)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn file_name(file: &PrintFile) -> &str {
    non_empty(file.file_name.as_deref()).unwrap_or(DEFAULT_FILE_NAME)
}

/// Format a rupee amount with two decimals, `0.00` when absent.
fn money(amount: Option<f64>) -> String {
    format!("{:.2}", amount.filter(|a| a.is_finite()).unwrap_or(0.0))
}

/// Minimal HTML escaping for user-supplied text placed in element content
/// or double-quoted attributes.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the completion email for `job`.
pub fn render(job: &PrintJob, options: &TemplateOptions) -> CompletionEmail {
    let settings = ResolvedSettings::resolve(job.settings.as_ref(), options);
    let order_id = non_empty(job.payment.as_ref().and_then(|p| p.order_id.as_deref()))
        .unwrap_or(NOT_AVAILABLE);
    let hub = non_empty(job.hub_name.as_deref()).unwrap_or(NOT_AVAILABLE);
    let amount = money(job.payment.as_ref().and_then(|p| p.amount));

    CompletionEmail {
        subject: SUBJECT.to_string(),
        html: render_html(job, &settings, order_id, hub, &amount, options),
        text: render_text(job, &settings, order_id, hub, &amount),
    }
}

fn render_html(
    job: &PrintJob,
    settings: &ResolvedSettings<'_>,
    order_id: &str,
    hub: &str,
    amount: &str,
    options: &TemplateOptions,
) -> String {
    let mut files_html = String::new();
    for file in &job.files {
        let _ = write!(
            files_html,
            r#"
    <tr>
      <td style="padding: 8px 0; border-bottom: 1px solid #eee;">
        <span style="color: #202124; font-weight: 500;">{name}</span><br>
        <span style="color: #5f6368; font-size: 12px;">{pages} pages • ₹{price}</span>
      </td>
    </tr>"#,
            name = escape_html(file_name(file)),
            pages = file.page_count.unwrap_or(0),
            price = money(file.price),
        );
    }

    let pages_line = if settings.all_pages() {
        "All pages".to_string()
    } else {
        format!("Pages: {}", escape_html(settings.page_range))
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f6f9fc;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background-color: #ffffff; border-radius: 10px; padding: 40px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);">
      <div style="text-align: center; margin-bottom: 30px;">
        <h1 style="color: #1a73e8; margin-bottom: 10px;">Print Job Completed! 🎉</h1>
        <p style="color: #5f6368; margin: 0;">Your documents are ready for collection</p>
      </div>

      <div style="background-color: #f8f9fa; border-radius: 8px; padding: 20px; margin-bottom: 30px;">
        <h2 style="color: #202124; margin-top: 0; font-size: 18px;">Job Details</h2>
        <table style="width: 100%; border-collapse: collapse;">
          <tr>
            <td style="padding: 8px 0; color: #5f6368;">Job ID:</td>
            <td style="padding: 8px 0; color: #202124;">{order_id}</td>
          </tr>
          <tr>
            <td style="padding: 8px 0; color: #5f6368;">Hub:</td>
            <td style="padding: 8px 0; color: #202124;">{hub}</td>
          </tr>
          <tr>
            <td style="padding: 8px 0; color: #5f6368;">Amount:</td>
            <td style="padding: 8px 0; color: #202124;">₹{amount}</td>
          </tr>
          <tr>
            <td style="padding: 8px 0; color: #5f6368;">Print Settings:</td>
            <td style="padding: 8px 0; color: #202124;">
              {color} • {paper} • {copies} {copies_label}<br>
              {sides} • {orientation}<br>
              {pages_line}
            </td>
          </tr>
        </table>
      </div>

      <div style="background-color: #f8f9fa; border-radius: 8px; padding: 20px; margin-bottom: 30px;">
        <h2 style="color: #202124; margin-top: 0; font-size: 18px;">Files</h2>
        <table style="width: 100%; border-collapse: collapse;">{files_html}
        </table>
      </div>

      <div style="text-align: center; margin-top: 30px;">
        <p style="color: #5f6368; margin-bottom: 20px;">Thank you for using our printing services!</p>
        <a href="{dashboard_url}"
           style="background-color: #1a73e8; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block;">
          View Dashboard
        </a>
      </div>

      <div style="margin-top: 40px; padding-top: 20px; border-top: 1px solid #e8eaed; text-align: center;">
        <p style="color: #5f6368; font-size: 12px;">
          This is an automated message, please do not reply to this email.<br>
          © PrintSuit. All rights reserved.
        </p>
      </div>
    </div>
  </div>
</body>
</html>
"#,
        order_id = escape_html(order_id),
        hub = escape_html(hub),
        amount = amount,
        color = escape_html(settings.color),
        paper = escape_html(settings.paper_size),
        copies = settings.copies,
        copies_label = settings.copies_label(),
        sides = settings.sides_label(),
        orientation = escape_html(settings.orientation),
        pages_line = pages_line,
        files_html = files_html,
        dashboard_url = escape_html(&options.dashboard_url),
    )
}

fn render_text(
    job: &PrintJob,
    settings: &ResolvedSettings<'_>,
    order_id: &str,
    hub: &str,
    amount: &str,
) -> String {
    let files = job
        .files
        .iter()
        .map(|f| format!("- {} ({} pages)", file_name(f), f.page_count.unwrap_or(0)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Your print job has been completed.\n\
         Job Details:\n\
         - Order ID: {order_id}\n\
         - Hub: {hub}\n\
         - Amount: ₹{amount}\n\
         \n\
         Files:\n\
         {files}\n\
         \n\
         Print Settings:\n\
         - Color: {color}\n\
         - Paper Size: {paper}\n\
         - Copies: {copies}\n\
         - Double-sided: {double_sided}\n\
         - Orientation: {orientation}\n\
         - Pages: {pages}\n\
         \n\
         Thank you for using our printing services!",
        color = settings.color,
        paper = settings.paper_size,
        copies = settings.copies,
        double_sided = if settings.double_sided { "Yes" } else { "No" },
        orientation = settings.orientation,
        pages = settings.page_range,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
