use std::{
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

/// Loopback HTTP server answering each connection with the next canned response
pub struct LocalServer {
    pub url: String,
    handle: JoinHandle<Vec<String>>,
}

impl LocalServer {
    /// Responses are `(status line, body)` pairs, one per expected request
    pub fn start(responses: Vec<(&'static str, &'static str)>) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = vec![];

            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(&stream);

                let mut head = String::new();

                loop {
                    let mut line = String::new();

                    if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                        break;
                    }

                    head.push_str(&line);
                }

                let content_length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .map(|(_, value)| value.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);

                let mut request_body = vec![0; content_length];
                reader.read_exact(&mut request_body).unwrap();

                requests.push(format!(
                    "{head}\r\n{}",
                    String::from_utf8_lossy(&request_body)
                ));

                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
            }

            requests
        });

        Self { url, handle }
    }

    /// Wait for every response to be sent, returning the raw requests received
    pub fn requests(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}
