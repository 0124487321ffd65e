//! DOM-backed surface and calibration probe.

use crate::page::{EDITOR_ELEMENT_ID, NOTE_CLASS, SELECTED_CLASS, css_mm, css_px, note_element_id};
use dozer_core::{CalibrationError, CalibrationProbe, Note, NoteId, NotePlacement, Surface};
use kurbo::Point;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, HtmlTextAreaElement};

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Draws notes as absolutely positioned `div`s inside the viewport.
pub struct DomSurface {
    document: Document,
    viewport: HtmlElement,
    editing: Option<NoteId>,
}

impl DomSurface {
    pub fn new(document: Document, viewport: HtmlElement) -> Self {
        Self { document, viewport, editing: None }
    }

    fn note_element(&self, id: NoteId) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(&note_element_id(id))
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn note_element_or_create(&self, id: NoteId) -> Result<HtmlElement, JsValue> {
        if let Some(el) = self.note_element(id) {
            return Ok(el);
        }
        let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        el.set_id(&note_element_id(id));
        el.set_class_name(NOTE_CLASS);
        self.viewport.append_child(&el)?;
        Ok(el)
    }

    /// Geometry is written in physical units; the browser does the scaling.
    fn try_draw(&self, note: &Note, html: &str) -> Result<(), JsValue> {
        let el = self.note_element_or_create(note.id)?;
        let style = el.style();
        style.set_property("position", "absolute")?;
        style.set_property("left", &css_mm(note.pos_um.x))?;
        style.set_property("top", &css_mm(note.pos_um.y))?;
        style.set_property("width", &css_mm(note.size_um.x))?;
        style.set_property("height", &css_mm(note.size_um.y))?;
        style.set_property("z-index", &note.z_index.to_string())?;
        if self.editing != Some(note.id) {
            el.set_inner_html(html);
        }
        Ok(())
    }

    fn try_open_editor(&mut self, id: NoteId, raw: &str) -> Result<(), JsValue> {
        let Some(el) = self.note_element(id) else {
            return Ok(());
        };
        let editor: HtmlTextAreaElement = self.document.create_element("textarea")?.dyn_into()?;
        editor.set_id(EDITOR_ELEMENT_ID);
        editor.set_value(raw);
        el.set_inner_html("");
        el.append_child(&editor)?;
        editor.focus()?;
        self.editing = Some(id);
        Ok(())
    }
}

impl Surface for DomSurface {
    fn draw_note(&mut self, note: &Note, _placement: &NotePlacement, html: &str) {
        if let Err(e) = self.try_draw(note, html) {
            log::error!("Failed to draw note {}: {}", note.id, describe(&e));
        }
    }

    fn note_offset_px(&self, id: NoteId) -> Option<Point> {
        let el = self.note_element(id)?;
        Some(Point::new(el.offset_left() as f64, el.offset_top() as f64))
    }

    fn set_note_offset_px(&mut self, id: NoteId, offset: Point) {
        let Some(el) = self.note_element(id) else {
            return;
        };
        let style = el.style();
        let moved = style
            .set_property("left", &css_px(offset.x))
            .and_then(|_| style.set_property("top", &css_px(offset.y)));
        if let Err(e) = moved {
            log::warn!("Failed to move note {}: {}", id, describe(&e));
        }
    }

    fn open_editor(&mut self, id: NoteId, raw: &str) {
        if let Err(e) = self.try_open_editor(id, raw) {
            log::error!("Failed to open editor on note {}: {}", id, describe(&e));
        }
    }

    fn close_editor(&mut self, id: NoteId) -> Option<String> {
        if self.editing != Some(id) {
            return None;
        }
        self.editing = None;
        let editor = self
            .document
            .get_element_by_id(EDITOR_ELEMENT_ID)?
            .dyn_into::<HtmlTextAreaElement>()
            .ok()?;
        let text = editor.value();
        editor.remove();
        Some(text)
    }

    fn set_selected(&mut self, id: NoteId, selected: bool) {
        if let Some(el) = self.note_element(id) {
            if let Err(e) = el.class_list().toggle_with_force(SELECTED_CLASS, selected) {
                log::warn!("Failed to mark note {} selected: {}", id, describe(&e));
            }
        }
    }
}

/// Measures a hidden square of known physical size inside `container`.
pub struct DomProbe {
    document: Document,
    container: HtmlElement,
}

impl DomProbe {
    pub fn new(document: Document, container: HtmlElement) -> Self {
        Self { document, container }
    }

    fn try_measure(&self, length_um: i64) -> Result<f64, JsValue> {
        let square: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        let style = square.style();
        style.set_property("position", "absolute")?;
        style.set_property("visibility", "hidden")?;
        style.set_property("width", &css_mm(length_um))?;
        style.set_property("height", &css_mm(length_um))?;
        self.container.append_child(&square)?;
        let px = square.offset_width() as f64;
        square.remove();
        Ok(px)
    }
}

impl CalibrationProbe for DomProbe {
    fn measure_reference(&mut self, length_um: i64) -> Result<f64, CalibrationError> {
        self.try_measure(length_um).map_err(|e| CalibrationError::Probe(describe(&e)))
    }
}
