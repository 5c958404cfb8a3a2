//! Error types for talking to the Docker daemon.

use hyper::StatusCode;

error_chain! {
    foreign_links {
        Hyper(hyper::Error);
        Http(hyper::http::Error);
        Io(::std::io::Error);
        Url(url::ParseError);
        Tls(rustls::Error) #[cfg(feature = "tls")];
    }

    errors {
        /// We could not connect to the Docker daemon.
        CouldNotConnect(host: String) {
            description("could not connect to Docker")
            display("could not connect to Docker at '{}'", host)
        }

        /// We could not find a home directory to look for certificates in.
        NoCertPath {
            description("could not find Docker certificate path")
            display("could not find Docker certificate path (try setting DOCKER_CERT_PATH)")
        }

        /// Could not parse a JSON response from the daemon.
        ParseError(wanted: &'static str, input: String) {
            description("error parsing JSON from Docker")
            display("error parsing JSON from Docker (wanted {}): {}", wanted, input)
        }

        /// The daemon answered with a non-success status.
        Daemon(status: StatusCode, message: String) {
            description("Docker daemon returned an error")
            display("Docker daemon returned {}: {}", status, message)
        }

        /// `DOCKER_API_VERSION` (or a daemon-reported version) was unusable.
        InvalidApiVersion(value: String) {
            description("invalid Docker API version")
            display("invalid Docker API version '{}'", value)
        }

        /// A request took longer than our timeout.
        Timeout(after: ::std::time::Duration) {
            description("request to Docker timed out")
            display("request to Docker timed out after {:?}", after)
        }

        /// The Docker URL scheme is not supported.
        UnsupportedScheme(host: String) {
            description("unsupported Docker URL scheme")
            display("do not know how to connect to Docker at '{}'", host)
        }
    }
}

impl Error {
    /// Flatten this error and everything that caused it onto one line.
    /// Daemon and proxy bodies can contain newlines; those become spaces.
    pub fn one_line(&self) -> String {
        self.iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ")
            .replace(|c: char| c.is_control(), " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_includes_whole_chain() {
        let err: Result<()> = Err(::std::io::Error::new(
            ::std::io::ErrorKind::NotFound,
            "No such file or directory",
        )
        .into());
        let err = err
            .chain_err(|| ErrorKind::CouldNotConnect("unix:///nope.sock".to_owned()))
            .unwrap_err();
        let line = err.one_line();
        assert!(line.starts_with("could not connect to Docker at 'unix:///nope.sock': "));
        assert!(line.contains("No such file or directory"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn one_line_strips_embedded_newlines() {
        let err: Error = ErrorKind::Daemon(
            StatusCode::BAD_GATEWAY,
            "<html>\r\nError: upstream\nSuccess!\n</html>".to_owned(),
        )
        .into();
        let line = err.one_line();
        assert_eq!(line.lines().count(), 1);
        assert!(line.contains("<html>  Error: upstream Success! </html>"));
    }

    #[test]
    fn daemon_error_mentions_status() {
        let err: Error = ErrorKind::Daemon(StatusCode::BAD_REQUEST, "too new".to_owned()).into();
        assert_eq!(err.to_string(), "Docker daemon returned 400 Bad Request: too new");
    }
}
