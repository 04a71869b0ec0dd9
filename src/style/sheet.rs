//! Widget stylesheet. Every selector is anchored on the scope attribute.

pub const SCOPE_ATTR: &str = "data-embedchat-scope";

pub const STYLESHEET: &str = r#"
[data-embedchat-scope], [data-embedchat-scope] * {
  all: revert;
  box-sizing: border-box;
  font-family: system-ui, -apple-system, "Segoe UI", Roboto, sans-serif;
}
[data-embedchat-scope] {
  position: fixed;
  right: 20px;
  bottom: 20px;
  z-index: 2147483000;
  font-size: 14px;
  line-height: 1.4;
  color: #1f2937;
}
[data-embedchat-scope] .ec-toggle {
  width: 56px;
  height: 56px;
  border: none;
  border-radius: 50%;
  background: #4f46e5;
  color: #fff;
  cursor: pointer;
  box-shadow: 0 4px 12px rgba(0, 0, 0, 0.2);
}
[data-embedchat-scope] .ec-panel {
  display: flex;
  flex-direction: column;
  width: 360px;
  height: 520px;
  margin-bottom: 12px;
  border-radius: 12px;
  background: #fff;
  box-shadow: 0 8px 24px rgba(0, 0, 0, 0.18);
  overflow: hidden;
}
[data-embedchat-scope] .ec-panel[hidden] { display: none; }
[data-embedchat-scope] .ec-header {
  display: flex;
  align-items: center;
  gap: 8px;
  padding: 12px 16px;
  background: #4f46e5;
  color: #fff;
}
[data-embedchat-scope] .ec-avatar {
  display: inline-flex;
  align-items: center;
  justify-content: center;
  width: 32px;
  height: 32px;
  border-radius: 50%;
  background: rgba(255, 255, 255, 0.25);
  font-weight: 600;
}
[data-embedchat-scope] .ec-title { flex: 1; font-weight: 600; }
[data-embedchat-scope] .ec-close {
  border: none;
  background: transparent;
  color: inherit;
  font-size: 20px;
  cursor: pointer;
}
[data-embedchat-scope] .ec-messages {
  flex: 1;
  padding: 12px;
  overflow-y: auto;
  background: #f9fafb;
}
[data-embedchat-scope] .ec-greeting { color: #6b7280; margin-bottom: 8px; }
[data-embedchat-scope] .ec-message { display: flex; flex-direction: column; margin: 6px 0; }
[data-embedchat-scope] .ec-message--user { align-items: flex-end; }
[data-embedchat-scope] .ec-message--assistant { align-items: flex-start; }
[data-embedchat-scope] .ec-bubble {
  max-width: 80%;
  padding: 8px 12px;
  border-radius: 12px;
  white-space: pre-wrap;
  word-wrap: break-word;
}
[data-embedchat-scope] .ec-message--user .ec-bubble { background: #4f46e5; color: #fff; }
[data-embedchat-scope] .ec-message--assistant .ec-bubble { background: #e5e7eb; }
[data-embedchat-scope] .ec-time { font-size: 11px; color: #9ca3af; margin-top: 2px; }
[data-embedchat-scope] .ec-typing { display: flex; gap: 4px; padding: 8px 12px; }
[data-embedchat-scope] .ec-dot {
  width: 6px;
  height: 6px;
  border-radius: 50%;
  background: #9ca3af;
  animation: ec-blink 1.2s infinite ease-in-out;
}
[data-embedchat-scope] .ec-dot:nth-child(2) { animation-delay: 0.2s; }
[data-embedchat-scope] .ec-dot:nth-child(3) { animation-delay: 0.4s; }
@keyframes ec-blink { 0%, 80%, 100% { opacity: 0.3; } 40% { opacity: 1; } }
[data-embedchat-scope] .ec-input-row { display: flex; gap: 8px; padding: 12px; border-top: 1px solid #e5e7eb; }
[data-embedchat-scope] .ec-input { flex: 1; padding: 8px 10px; border: 1px solid #d1d5db; border-radius: 8px; }
[data-embedchat-scope] .ec-send { padding: 8px 14px; border: none; border-radius: 8px; background: #4f46e5; color: #fff; cursor: pointer; }
[data-embedchat-scope] .ec-send[disabled] { opacity: 0.5; cursor: default; }
[data-embedchat-scope] :focus-visible { outline: 2px solid #a5b4fc; outline-offset: 2px; }
"#;
