//! Yealink remote phonebook markup.
//!
//! ```text
//! <YealinkIPPhoneBook>
//!   <Menu Name="01. Sales">
//!     <Unit Name="Alice" default_photo="" Phone1="100" Phone2="" Phone3=""/>
//!   </Menu>
//! </YealinkIPPhoneBook>
//! ```
//!
//! Menu names carry a two-digit position prefix because the phones sort
//! menus alphabetically; the prefix is stripped again when decoding.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::escape;
use quick_xml::Reader;
use regex::Regex;

use crate::error::{PhonebookError, PhonebookResult};
use crate::models::{Contact, Phonebook};

pub const ROOT_TAG: &str = "YealinkIPPhoneBook";
pub const GROUP_TAG: &str = "Menu";
pub const CONTACT_TAG: &str = "Unit";

static ORDER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{2}\.\s+").expect("order prefix pattern is valid"));

/// Strip one leading `NN. ` display-order prefix from a menu name.
pub fn strip_order_prefix(raw: &str) -> &str {
    match ORDER_PREFIX.find(raw) {
        Some(m) => &raw[m.end()..],
        None => raw,
    }
}

fn format_error(context: &str, err: impl std::fmt::Display) -> PhonebookError {
    PhonebookError::Format(format!("{}: {}", context, err))
}

fn attribute(element: &BytesStart<'_>, key: &str) -> PhonebookResult<String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| format_error("malformed attribute", e))?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| format_error("malformed attribute value", e))?;
            return Ok(value.into_owned());
        }
    }
    Ok(String::new())
}

fn decode_contact(element: &BytesStart<'_>) -> PhonebookResult<Contact> {
    Ok(Contact {
        name: attribute(element, "Name")?,
        photo_ref: attribute(element, "default_photo")?,
        office_number: attribute(element, "Phone1")?,
        mobile_number: attribute(element, "Phone2")?,
        other_number: attribute(element, "Phone3")?,
    })
}

#[derive(Default)]
struct DecodeState {
    phonebook: Phonebook,
    depth: usize,
    root_seen: bool,
    current_group: Option<String>,
}

impl DecodeState {
    fn open(&mut self, element: &BytesStart<'_>) -> PhonebookResult<()> {
        let name = element.name();
        let name = name.as_ref();
        match self.depth {
            0 => {
                if self.root_seen {
                    return Err(PhonebookError::Format(
                        "more than one root element".to_string(),
                    ));
                }
                if name != ROOT_TAG.as_bytes() {
                    return Err(PhonebookError::Format(format!(
                        "expected root element <{}>, found <{}>",
                        ROOT_TAG,
                        String::from_utf8_lossy(name)
                    )));
                }
                self.root_seen = true;
            }
            1 if name == GROUP_TAG.as_bytes() => {
                let raw = attribute(element, "Name")?;
                let group = strip_order_prefix(&raw).to_string();
                self.phonebook.group_entry(&group);
                self.current_group = Some(group);
            }
            2 if name == CONTACT_TAG.as_bytes() => {
                if let Some(group) = &self.current_group {
                    let contact = decode_contact(element)?;
                    self.phonebook.group_entry(group).push(contact);
                }
            }
            _ => {}
        }
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth <= 1 {
            self.current_group = None;
        }
    }
}

/// Parse a phonebook file.
///
/// Unknown elements and attributes are skipped. A document without the
/// `YealinkIPPhoneBook` root, or one that is not well-formed, is a
/// [`PhonebookError::Format`].
pub fn decode(bytes: &[u8]) -> PhonebookResult<Phonebook> {
    let text = std::str::from_utf8(bytes).map_err(|e| format_error("not valid UTF-8", e))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut state = DecodeState::default();
    loop {
        let event = reader.read_event().map_err(|e| {
            format_error(
                &format!("malformed markup at byte {}", reader.buffer_position()),
                e,
            )
        })?;
        match event {
            Event::Start(element) => state.open(&element)?,
            Event::Empty(element) => {
                state.open(&element)?;
                state.close();
            }
            Event::End(_) => state.close(),
            Event::Eof => break,
            _ => {}
        }
    }

    if !state.root_seen {
        return Err(PhonebookError::Format(format!(
            "missing root element <{}>",
            ROOT_TAG
        )));
    }
    if state.depth != 0 {
        return Err(PhonebookError::Format(
            "unexpected end of document".to_string(),
        ));
    }
    Ok(state.phonebook)
}

/// Serialize a phonebook in canonical form.
///
/// Attributes are always written in the order `Name`, `default_photo`,
/// `Phone1`, `Phone2`, `Phone3`. An empty phonebook is the two-line
/// root skeleton.
pub fn encode(phonebook: &Phonebook) -> Vec<u8> {
    let mut out = String::with_capacity(64 + phonebook.contact_count() * 96);
    out.push_str(&format!("<{}>\n", ROOT_TAG));
    for (idx, group) in phonebook.groups().iter().enumerate() {
        let menu_name = format!("{:02}. {}", idx + 1, group.name);
        out.push_str(&format!(
            "  <{} Name=\"{}\">\n",
            GROUP_TAG,
            escape(menu_name.as_str())
        ));
        for contact in &group.contacts {
            out.push_str(&format!(
                "    <{} Name=\"{}\" default_photo=\"{}\" Phone1=\"{}\" Phone2=\"{}\" Phone3=\"{}\"/>\n",
                CONTACT_TAG,
                escape(contact.name.as_str()),
                escape(contact.photo_ref.as_str()),
                escape(contact.office_number.as_str()),
                escape(contact.mobile_number.as_str()),
                escape(contact.other_number.as_str()),
            ));
        }
        out.push_str(&format!("  </{}>\n", GROUP_TAG));
    }
    out.push_str(&format!("</{}>\n", ROOT_TAG));
    out.into_bytes()
}
