// routes/home.rs
// GET / -> login page with a minimal form that posts JSON to /login.

use axum::response::Html;

pub async fn home() -> Html<&'static str> {
    Html(r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>QuickBill Login</title>
</head>
<body>
  <main>
    <h1>QuickBill</h1>
    <form id="login-form">
      <label>
        Email
        <input id="email" name="email" type="email" required>
      </label>
      <label>
        Authenticator code
        <input id="code" name="code" inputmode="numeric" pattern="\d*" required>
      </label>
      <button type="submit">Sign in</button>
    </form>
    <pre id="result"></pre>
  </main>
  <script>
    const form = document.getElementById('login-form');
    const result = document.getElementById('result');

    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      const body = {
        email: form.email.value.trim(),
        code: form.code.value.trim()
      };

      try {
        const response = await fetch('/login', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(body)
        });
        const data = await response.json().catch(() => ({}));
        if (response.ok && data.redirect_url) {
          window.location.href = data.redirect_url;
          return;
        }
        result.textContent = data.error || 'Invalid code';
      } catch (err) {
        result.textContent = 'Could not reach the server';
      }
    });
  </script>
</body>
</html>
"#)
}
