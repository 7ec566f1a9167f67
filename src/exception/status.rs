use axum::http::StatusCode;

/// Error statuses covered when a handler is registered without a code.
pub const STANDARD_ERROR_CODES: [u16; 30] = [
    400, 401, 403, 404, 405, 406, 408, 409, 410, 411, 412, 413, 414, 415, 416, 417, 418, 422,
    423, 424, 428, 429, 431, 451, 500, 501, 502, 503, 504, 505,
];

/// Standard name of a status code.
pub fn title(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Error")
}

/// Generic explanation used when an exception carries no description.
pub fn default_description(status: StatusCode) -> &'static str {
    match status.as_u16() {
        308 => "The URL has moved permanently to a new location.",
        400 => "The browser (or proxy) sent a request that this server could not understand.",
        401 => {
            "The server could not verify that you are authorized to access the URL requested."
        }
        403 => "You don't have the permission to access the requested resource.",
        404 => {
            "The requested URL was not found on the server. If you entered the URL manually \
             please check your spelling and try again."
        }
        405 => "The method is not allowed for the requested URL.",
        406 => "The resource identified by the request is not capable of generating a response \
                acceptable to the request headers.",
        408 => "The server closed the network connection because the browser didn't finish \
                the request within the specified time.",
        409 => "A conflict happened while processing the request.",
        410 => "The requested URL is no longer available on this server.",
        411 => "A request with this method requires a valid Content-Length header.",
        412 => "The precondition on the request for the URL failed positive evaluation.",
        413 => "The data value transmitted exceeds the capacity limit.",
        414 => "The length of the requested URL exceeds the capacity limit for this server.",
        415 => "The server does not support the media type transmitted in the request.",
        416 => "The server cannot provide the requested range.",
        417 => "The server could not meet the requirements of the Expect header",
        418 => "This server is a teapot, not a coffee machine",
        422 => "The request was well-formed but was unable to be followed due to semantic errors.",
        423 => "The resource that is being accessed is locked.",
        424 => "The method could not be performed on the resource because the requested action \
                depended on another action and that action failed.",
        428 => "This request is required to be conditional.",
        429 => "This user has exceeded an allotted request count.",
        431 => "One or more header fields exceeds the maximum size.",
        451 => "Unavailable for legal reasons.",
        500 => "The server encountered an internal error and was unable to complete your request.",
        501 => "The server does not support the action requested by the browser.",
        502 => "The proxy server received an invalid response from an upstream server.",
        503 => "The server is temporarily unable to service your request. Please try again later.",
        504 => "The connection to an upstream server timed out.",
        505 => "The server does not support the HTTP protocol version used in the request.",
        _ => title(status),
    }
}
