//! WASM entry point: boots a notepage session and wires DOM events into it.

use crate::dom::{DomProbe, DomSurface};
use crate::page::{
    BOOTSTRAP_ELEMENT_ID, Bootstrap, CREATE_NOTE_ACTION_ID, NOTE_CLASS, PUMP_INTERVAL_MS,
    VIEWPORT_ELEMENT_ID, note_id_from_element_id,
};
use dozer_core::transport::FetchTransport;
use dozer_core::{
    Canvas, HitTarget, Key, KeyEvent, Modifiers, MouseButton, NotepageSession, PointerEvent,
};
use kurbo::Point;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, EventTarget, HtmlElement, KeyboardEvent, MouseEvent};

type WebSession = NotepageSession<FetchTransport, DomSurface>;
type SharedSession = Rc<RefCell<WebSession>>;

/// Initialize and run the notepage client.
#[wasm_bindgen(start)]
pub fn run_wasm() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info)
        .map_err(|e| JsValue::from_str(&format!("Failed to initialize logger: {}", e)))?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;

    let bootstrap_json = document
        .get_element_by_id(BOOTSTRAP_ELEMENT_ID)
        .and_then(|el| el.text_content())
        .ok_or_else(|| JsValue::from_str("No notepage bootstrap data"))?;
    let bootstrap = Bootstrap::from_json(&bootstrap_json)
        .map_err(|e| JsValue::from_str(&format!("Bad notepage bootstrap data: {}", e)))?;

    let viewport: HtmlElement = document
        .get_element_by_id(VIEWPORT_ELEMENT_ID)
        .ok_or_else(|| JsValue::from_str("No viewport"))?
        .dyn_into()?;

    let config = bootstrap.config.unwrap_or_default();
    log::info!("Starting Dozer notepage {} (endpoint {})", bootstrap.notepage.full_name, config.endpoint);

    let canvas = Canvas::from_notepage(&bootstrap.notepage, bootstrap.notes);
    let transport = FetchTransport::new(&config.endpoint);
    let surface = DomSurface::new(document.clone(), viewport.clone());
    let mut probe = DomProbe::new(document.clone(), viewport.clone());
    let session = NotepageSession::open(config, canvas, transport, surface, &mut probe)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let session: SharedSession = Rc::new(RefCell::new(session));

    install_pointer_listeners(&window, &viewport, &session)?;
    install_key_listener(&window, &session)?;
    install_create_action(&document, &session)?;
    install_pump(&window, &session)?;
    Ok(())
}

// ============================================================================
// Event translation
// ============================================================================

fn position(event: &MouseEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers { shift, ctrl, alt, meta }
}

/// Resolve what a pointer event hit: a note's own element, something inside
/// a note, or the bare canvas.
fn hit_target(event: &MouseEvent) -> HitTarget {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return HitTarget::Canvas;
    };
    let Some(note_el) = target.closest(&format!(".{}", NOTE_CLASS)).ok().flatten() else {
        return HitTarget::Canvas;
    };
    let Some(id) = note_id_from_element_id(&note_el.id()) else {
        return HitTarget::Canvas;
    };
    if note_el == target { HitTarget::Note(id) } else { HitTarget::NoteControl(id) }
}

fn dispatch_pointer(session: &SharedSession, event: &MouseEvent, pointer: PointerEvent) {
    let Ok(mut session) = session.try_borrow_mut() else {
        log::debug!("Session busy, dropping {:?}", pointer);
        return;
    };
    if session.handle_pointer(&pointer) {
        event.prevent_default();
        event.stop_propagation();
    }
}

fn add_mouse_listener<F>(target: &EventTarget, name: &str, handler: F) -> Result<(), JsValue>
where
    F: Fn(MouseEvent) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn Fn(MouseEvent)>);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// ============================================================================
// Listeners
// ============================================================================

fn install_pointer_listeners(
    window: &web_sys::Window,
    viewport: &HtmlElement,
    session: &SharedSession,
) -> Result<(), JsValue> {
    let s = session.clone();
    add_mouse_listener(viewport, "mousedown", move |event| {
        let Some(button) = MouseButton::from_dom(event.button()) else {
            return;
        };
        let pointer = PointerEvent::Down { position: position(&event), button, target: hit_target(&event) };
        dispatch_pointer(&s, &event, pointer);
    })?;

    // Moves and releases are tracked on the window so a drag survives the
    // pointer leaving the viewport.
    let s = session.clone();
    add_mouse_listener(window, "mousemove", move |event| {
        let pointer = PointerEvent::Move { position: position(&event), primary_held: event.buttons() & 1 == 1 };
        dispatch_pointer(&s, &event, pointer);
    })?;

    let s = session.clone();
    add_mouse_listener(window, "mouseup", move |event| {
        let Some(button) = MouseButton::from_dom(event.button()) else {
            return;
        };
        let pointer = PointerEvent::Up { position: position(&event), button };
        dispatch_pointer(&s, &event, pointer);
    })?;

    let s = session.clone();
    add_mouse_listener(viewport, "click", move |event| {
        let Some(button) = MouseButton::from_dom(event.button()) else {
            return;
        };
        let pointer = PointerEvent::Click {
            position: position(&event),
            button,
            target: hit_target(&event),
            modifiers: modifiers(event.shift_key(), event.ctrl_key(), event.alt_key(), event.meta_key()),
        };
        dispatch_pointer(&s, &event, pointer);
    })?;

    let s = session.clone();
    add_mouse_listener(viewport, "dblclick", move |event| {
        let pointer = PointerEvent::DoubleClick { position: position(&event), target: hit_target(&event) };
        dispatch_pointer(&s, &event, pointer);
    })?;

    let s = session.clone();
    let onblur = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        if let Ok(mut session) = s.try_borrow_mut() {
            session.focus_lost();
        }
    }) as Box<dyn Fn(_)>);
    window.add_event_listener_with_callback("blur", onblur.as_ref().unchecked_ref())?;
    onblur.forget();

    Ok(())
}

fn install_key_listener(window: &web_sys::Window, session: &SharedSession) -> Result<(), JsValue> {
    let s = session.clone();
    let onkeydown = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        let key = KeyEvent::new(
            Key::from_dom(&event.key()),
            modifiers(event.shift_key(), event.ctrl_key(), event.alt_key(), event.meta_key()),
        );
        let Ok(mut session) = s.try_borrow_mut() else {
            return;
        };
        if session.handle_key(&key) {
            event.prevent_default();
            event.stop_propagation();
        }
    }) as Box<dyn Fn(_)>);
    window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
    onkeydown.forget();
    Ok(())
}

fn install_create_action(document: &Document, session: &SharedSession) -> Result<(), JsValue> {
    let Some(action) = document.get_element_by_id(CREATE_NOTE_ACTION_ID) else {
        log::info!("No #{} on this page", CREATE_NOTE_ACTION_ID);
        return Ok(());
    };
    let s = session.clone();
    add_mouse_listener(&action, "click", move |event| {
        event.prevent_default();
        let Ok(mut session) = s.try_borrow_mut() else {
            return;
        };
        if let Err(e) = session.create_note(None, None) {
            log::error!("Cannot create note: {}", e);
        }
    })
}

fn install_pump(window: &web_sys::Window, session: &SharedSession) -> Result<(), JsValue> {
    let s = session.clone();
    let tick = Closure::wrap(Box::new(move || {
        let Ok(mut session) = s.try_borrow_mut() else {
            return;
        };
        for event in session.pump() {
            log::debug!("{:?}", event);
        }
    }) as Box<dyn FnMut()>);
    window.set_interval_with_callback_and_timeout_and_arguments_0(
        tick.as_ref().unchecked_ref(),
        PUMP_INTERVAL_MS,
    )?;
    tick.forget();
    Ok(())
}
