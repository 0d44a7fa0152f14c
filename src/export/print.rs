/// Wrap HTML in the standalone page used for printing
pub fn print_envelope(html: &str) -> String {
    format!(
        "<html><head><title>Print</title>\
         <style>body {{ font-family: Arial, sans-serif; margin: 20px; }}</style>\
         </head><body>{}</body></html>",
        html
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_envelope_layout() {
        let page = print_envelope("<p>Kesimpta</p>");
        assert!(page.starts_with("<html><head><title>Print</title>"));
        assert!(page.contains("font-family: Arial, sans-serif; margin: 20px;"));
        assert!(page.ends_with("<body><p>Kesimpta</p></body></html>"));
    }
}
