//! Parse raw requests and see what the mux would route on.

use microweb::parse_request;

fn main() {
    let request_bytes =
        b"GET /search/rust?page=2 HTTP/1.1\r\nHost: example.com\r\nUser-Agent: ExampleBrowser/1.0\r\n\r\n";

    match parse_request(request_bytes) {
        Ok(request) => {
            println!("Method: {}", request.method);
            println!("Routed path: {}", request.url_path());
            println!("Query: {}", request.query().unwrap_or("-"));
            println!("Version: {}", request.version);
            for (name, value) in &request.headers {
                println!("  {name}: {value}");
            }
        }
        Err(err) => println!("Error parsing request: {err}"),
    }

    let invalid_request = b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
    if let Err(err) = parse_request(invalid_request) {
        println!("\nRejected: {err}");
    }
}
