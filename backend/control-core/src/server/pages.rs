//! Static pages served to the phone.

use crate::ACTION_ROUTE;

use const_format::concatcp;

const PAGE_HEAD: &str = r#"<html><head><meta charset="UTF-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"><style>body{text-align:center;padding-top:50px;font-family:sans-serif;background-color:#f4f4f9;}.container{max-width:400px;margin:0 auto;padding:20px;background:white;border-radius:20px;box-shadow:0 4px 6px rgba(0,0,0,0.1);}.btn{width:100%;height:100px;font-size:24px;background:#e74c3c;color:white;border:none;border-radius:15px;cursor:pointer;}.success{color:#27ae60;font-size:48px;margin-bottom:20px;}.msg{font-size:20px;color:#7f8c8d;}</style>"#;

/// Control page: one button, a confirm prompt, then navigation to the action route.
pub const INDEX_PAGE: &str = concatcp!(
    PAGE_HEAD,
    r#"<script>function doAction(){if(confirm("Hibernate this computer now?")){window.location.href=""#,
    ACTION_ROUTE,
    r#"";}}</script></head><body><div class="container"><h2>Remote Hibernate</h2><button class="btn" onclick="doAction()">Hibernate now</button></div></body></html>"#
);

/// Shown once a trigger is accepted; bounces back to the control page.
pub const CONFIRMATION_PAGE: &str = concatcp!(
    PAGE_HEAD,
    r#"</head><body><div class="container"><div class="success">&#10003;</div><div class="msg">Command sent, the computer will hibernate shortly.</div></div><script>setTimeout(()=>{window.location.href="/";},500);</script></body></html>"#
);

/// Body of the response to a trigger inside the cooldown window.
pub const REJECTED_BODY: &str = "Already triggered, try again in a few seconds.";
