use crate::dom;
use crate::error::ProbeError;
use crate::wait;

const TRACER_STYLE: &str = "position: absolute; z-index: 2147483647; width: 17px; pointer-events: none;";

// Puts the arrow's tip, not the icon's box corner, on the pointer position.
const TIP_OFFSET_X: f64 = 2.0;
const TIP_OFFSET_Y: f64 = 3.0;

/// Mounts the cursor icon parsed from `icon_markup` under `icon_id`, once
/// per page. Returns `false` if the icon is already mounted.
pub async fn init_mouse_tracer(icon_id: &str, icon_markup: &str) -> Result<bool, ProbeError> {
    wait::wait_load().await?;

    let document = dom::document()?;
    if document.get_element_by_id(icon_id).is_some() {
        return Ok(false);
    }

    let scratch = document.create_element("div")?;
    scratch.set_inner_html(icon_markup);
    let icon = scratch
        .last_element_child()
        .ok_or_else(|| ProbeError::invalid_node("Tracer markup contains no element"))?;
    icon.set_id(icon_id);
    icon.set_attribute("style", TRACER_STYLE)?;
    // Let the 17px CSS width drive the size.
    icon.remove_attribute("width")?;
    icon.remove_attribute("height")?;
    dom::body(&document)?.append_child(&icon)?;

    update_mouse_tracer(icon_id, 0.0, 0.0)?;
    probe_log!("initMouseTracer: mounted '{}'", icon_id);
    Ok(true)
}

/// Moves the icon to the pointer position. `false` means the icon is gone
/// (e.g. after a navigation) and the driver should initialize it again.
pub fn update_mouse_tracer(icon_id: &str, x: f64, y: f64) -> Result<bool, ProbeError> {
    let icon = match dom::document()?.get_element_by_id(icon_id) {
        Some(icon) => icon,
        None => return Ok(false),
    };
    let style = dom::inline_style(&icon)?;
    dom::set_px(&style, "left", x - TIP_OFFSET_X)?;
    dom::set_px(&style, "top", y - TIP_OFFSET_Y)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40" viewBox="0 0 10 10"><path d="M0 0 L10 5 L5 10 Z"/></svg>"#;

    #[wasm_bindgen_test]
    async fn test_tracer_mounts_once_and_moves() {
        assert!(init_mouse_tracer("tracer-test", ICON).await.unwrap());
        assert!(!init_mouse_tracer("tracer-test", "<svg></svg>").await.unwrap());

        let document = dom::document().unwrap();
        assert_eq!(document.query_selector_all("#tracer-test").unwrap().length(), 1);
        let icon = document.get_element_by_id("tracer-test").unwrap();
        assert!(icon.get_attribute("width").is_none());
        assert!(icon.get_attribute("height").is_none());

        assert!(update_mouse_tracer("tracer-test", 100.0, 50.0).unwrap());
        let style = dom::inline_style(&icon).unwrap();
        assert_eq!(style.get_property_value("left").unwrap(), "98px");
        assert_eq!(style.get_property_value("top").unwrap(), "47px");
        assert_eq!(style.get_property_value("pointer-events").unwrap(), "none");
        icon.remove();
    }

    #[wasm_bindgen_test]
    fn test_update_missing_tracer_reports_not_found() {
        assert!(!update_mouse_tracer("tracer-absent", 1.0, 1.0).unwrap());
    }

    #[wasm_bindgen_test]
    async fn test_tracer_markup_without_element_is_invalid() {
        let result = init_mouse_tracer("tracer-text-only", "just text").await;
        assert!(matches!(result, Err(ProbeError::InvalidNode { .. })));
    }
}
