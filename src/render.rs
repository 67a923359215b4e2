//! HTML rendering for every page the application serves.
//!
//! Pages are identified by a logical template name (`office/list.html`, `login.html`, ...)
//! and built from a [`View`]. The template name is written into the document so the page
//! that produced a response can be identified without parsing its layout. Every
//! interpolated string goes through [`escape`].

use std::fmt::Write;

use crate::routes::Target;
use crate::schema::{self, FieldSpec, FieldType};
use crate::validate::FieldErrors;
use crate::{EntityKind, FormData, Record};

/// Options for one reference field: `(key, label)` pairs in key order.
pub type Choices = Vec<(i64, String)>;

/// What a page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// All rows of a kind.
    List {
        /// Kind being listed.
        kind: EntityKind,
        /// Rows in key order.
        records: Vec<Record>,
    },
    /// One row.
    Detail {
        /// The row.
        record: Record,
    },
    /// A create form (no `id`) or an edit form.
    Form {
        /// Kind being written.
        kind: EntityKind,
        /// Key of the row under edit.
        id: Option<i64>,
        /// Values to pre-populate, as submitted or as stored.
        values: FormData,
        /// Errors from the last submission.
        errors: FieldErrors,
        /// Options for each reference field, keyed by field name.
        choices: Vec<(&'static str, Choices)>,
        /// One-shot message shown above the form.
        notice: Option<String>,
    },
    /// The sign-in form.
    Login {
        /// Username to pre-populate.
        username: String,
        /// Form-wide error.
        error: Option<String>,
    },
    /// The account registration form.
    Register {
        /// Values to pre-populate. Passwords are never echoed.
        values: FormData,
        /// Errors from the last submission.
        errors: FieldErrors,
    },
}

/// Escapes text for an HTML text node or a double-quoted attribute.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders `view` as a complete HTML document tagged with `template`.
pub fn render(template: &str, view: &View) -> String {
    let (title, body) = match view {
        View::List { kind, records } => (kind.plural_title().to_string(), list(*kind, records)),
        View::Detail { record } => (
            format!("{} ID: {}", record.kind().title(), record.id()),
            detail(record),
        ),
        View::Form {
            kind,
            id,
            values,
            errors,
            choices,
            notice,
        } => {
            let title = match id {
                Some(id) => format!("Edit {} ID: {}", kind.title(), id),
                None => format!("New {}", kind.title()),
            };
            let mut body = String::new();
            if let Some(notice) = notice {
                let _ = writeln!(body, "<p class=\"notice\">{}</p>", escape(notice));
            }
            body.push_str(&form(*kind, *id, values, errors, choices));
            (title, body)
        }
        View::Login { username, error } => {
            ("Sign in".to_string(), login(username, error.as_deref()))
        }
        View::Register { values, errors } => {
            ("Register".to_string(), register(values, errors))
        }
    };
    page(template, &title, &body, true)
}

/// The page shown for a key that resolves to no row.
pub fn not_found(message: &str) -> String {
    let body = format!("<p>{}</p>", escape(message));
    page("404.html", "Not Found", &body, false)
}

/// The page shown when the store fails underneath a request.
pub fn server_error() -> String {
    page(
        "500.html",
        "Server Error",
        "<p>Something went wrong. Please try again later.</p>",
        false,
    )
}

fn page(template: &str, title: &str, body: &str, navigation: bool) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(title));
    html.push_str("</head>\n");
    let _ = writeln!(html, "<body data-template=\"{}\">", escape(template));
    if navigation {
        html.push_str(&nav());
    }
    let _ = writeln!(html, "<h1>{}</h1>", escape(title));
    html.push_str(body);
    html.push_str("\n</body>\n</html>\n");
    html
}

fn nav() -> String {
    let mut html = String::from("<nav>\n");
    for kind in EntityKind::ALL {
        let _ = writeln!(
            html,
            "<a href=\"{}\">{}</a>",
            escape(&Target::List(kind).path()),
            kind.plural_title()
        );
    }
    let _ = writeln!(
        html,
        "<a href=\"{}\">Log a distance</a>",
        escape(&Target::Create(EntityKind::Distance).path())
    );
    let _ = writeln!(html, "<a href=\"{}\">Sign out</a>", escape(&Target::Logout.path()));
    html.push_str("</nav>\n");
    html
}

fn link(target: &Target, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(&target.path()), escape(text))
}

fn list(kind: EntityKind, records: &[Record]) -> String {
    let mut html = String::new();
    if records.is_empty() {
        let _ = writeln!(html, "<p>No {} yet.</p>", kind.plural_title().to_lowercase());
    } else {
        html.push_str("<ul>\n");
        for record in records {
            let _ = writeln!(
                html,
                "<li>{}</li>",
                link(&Target::Detail(kind, record.id()), &record.label())
            );
        }
        html.push_str("</ul>\n");
    }
    let _ = writeln!(
        html,
        "<p>{}</p>",
        link(&Target::Create(kind), &format!("Add {}", kind.name()))
    );
    html
}

fn detail(record: &Record) -> String {
    let kind = record.kind();
    let id = record.id();
    let mut html = String::from("<dl>\n");
    for (label, value) in record.display_fields() {
        let _ = writeln!(html, "<dt>{}:</dt> <dd>{}</dd>", escape(label), escape(&value));
    }
    html.push_str("</dl>\n");
    let _ = writeln!(html, "<p>{}</p>", link(&Target::Edit(kind, id), "Edit"));
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"{}\"><button type=\"submit\">Delete</button></form>",
        escape(&Target::Delete(kind, id).path())
    );
    let _ = writeln!(
        html,
        "<p>{}</p>",
        link(&Target::List(kind), &format!("All {}", kind.plural_title().to_lowercase()))
    );
    html
}

fn error_list(message: Option<&str>) -> String {
    match message {
        Some(message) => format!(
            "<ul class=\"errorlist\"><li>{}</li></ul>\n",
            escape(message)
        ),
        None => String::new(),
    }
}

fn input(kind: &str, name: &str, value: &str, max_length: Option<usize>) -> String {
    let mut html = format!(
        "<input type=\"{}\" name=\"{}\" id=\"id_{}\" value=\"{}\"",
        kind,
        name,
        name,
        escape(value)
    );
    if let Some(max_length) = max_length {
        let _ = write!(html, " maxlength=\"{}\"", max_length);
    }
    html.push('>');
    html
}

fn select(name: &str, value: &str, choices: &[(i64, String)]) -> String {
    let mut html = format!("<select name=\"{}\" id=\"id_{}\">\n", name, name);
    html.push_str("<option value=\"\">---------</option>\n");
    for (id, label) in choices {
        let key = id.to_string();
        let selected = if key == value { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            key,
            selected,
            escape(label)
        );
    }
    html.push_str("</select>");
    html
}

fn widget(field: &FieldSpec, value: &str, choices: &[(&'static str, Choices)]) -> String {
    match field.field_type {
        FieldType::Text { max_length } => input("text", field.name, value, Some(max_length)),
        FieldType::Email { max_length } => input("email", field.name, value, Some(max_length)),
        FieldType::Date => input("date", field.name, value, None),
        FieldType::Decimal => input("text", field.name, value, None),
        FieldType::Reference(_) => {
            let options = choices
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, options)| options.as_slice())
                .unwrap_or_default();
            select(field.name, value, options)
        }
    }
}

fn form(
    kind: EntityKind,
    id: Option<i64>,
    values: &FormData,
    errors: &FieldErrors,
    choices: &[(&'static str, Choices)],
) -> String {
    let action = match id {
        Some(id) => Target::Edit(kind, id),
        None => Target::Create(kind),
    };
    let mut html = format!(
        "<form method=\"post\" action=\"{}\">\n",
        escape(&action.path())
    );
    for field in schema::fields(kind) {
        let value = values.get(field.name).map(String::as_str).unwrap_or("");
        html.push_str(&error_list(errors.get(field.name)));
        let _ = writeln!(
            html,
            "<p><label for=\"id_{}\">{}:</label> {}</p>",
            field.name,
            escape(field.label),
            widget(field, value, choices)
        );
    }
    html.push_str("<button type=\"submit\">Save</button>\n</form>\n");
    let back = match id {
        Some(id) => Target::Detail(kind, id),
        None => Target::List(kind),
    };
    let _ = writeln!(html, "<p>{}</p>", link(&back, "Cancel"));
    html
}

fn login(username: &str, error: Option<&str>) -> String {
    let mut html = error_list(error);
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"{}\">",
        escape(&Target::Login.path())
    );
    let _ = writeln!(
        html,
        "<p><label for=\"id_username\">Username:</label> {}</p>",
        input("text", "username", username, Some(30))
    );
    let _ = writeln!(
        html,
        "<p><label for=\"id_password\">Password:</label> {}</p>",
        input("password", "password", "", Some(40))
    );
    html.push_str("<button type=\"submit\">Sign in</button>\n</form>\n");
    let _ = writeln!(html, "<p>{}</p>", link(&Target::Register, "Create an account"));
    html
}

fn register(values: &FormData, errors: &FieldErrors) -> String {
    const FIELDS: [(&str, &str, &str); 4] = [
        ("username", "Username", "text"),
        ("email", "Email", "email"),
        ("password1", "Password", "password"),
        ("password2", "Password confirmation", "password"),
    ];
    let mut html = format!(
        "<form method=\"post\" action=\"{}\">\n",
        escape(&Target::Register.path())
    );
    for (name, label, kind) in FIELDS {
        let value = match kind {
            "password" => "",
            _ => values.get(name).map(String::as_str).unwrap_or(""),
        };
        html.push_str(&error_list(errors.get(name)));
        let _ = writeln!(
            html,
            "<p><label for=\"id_{}\">{}:</label> {}</p>",
            name,
            label,
            input(kind, name, value, None)
        );
    }
    html.push_str("<button type=\"submit\">Register</button>\n</form>\n");
    let _ = writeln!(html, "<p>{}</p>", link(&Target::Login, "Already registered? Sign in"));
    html
}
